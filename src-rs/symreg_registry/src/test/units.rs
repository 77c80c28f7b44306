use symreg_expr::{Symbol, Value};

use super::{assert_close, call, registry};
use crate::{Callable, Registry, RegistryError, WrapOptions, wrap};

fn arg_unit(registry: &Registry, name: &str, arg: &str) -> Option<String> {
    registry
        .get(name)
        .and_then(|implementation| implementation.arg_units().get(arg).cloned())
}

#[test]
fn declared_output_unit_scales_the_result() {
    let mut registry = registry(&["$a(x[m])[km/s] = x$", "$b(y[cm])[m/s] = y$"]);

    registry
        .assign("c(x[m],y[m])[m/s]", "$a + b$")
        .expect("c registers");

    assert_eq!(call(&registry, "c", &[1.0, 2.0]), Ok(1200.0));
    assert_eq!(registry.get("c").expect("c is registered").units(), "m/s");
}

#[test]
fn incompatible_argument_units_leave_registry_unchanged() {
    let mut registry = registry(&["a(x[kg])[m] = x", "b(y[cm])[km] = y"]);

    let error = registry
        .assign("c(x[cm],y[cm])[km]", "2*a + 3*b")
        .expect_err("x is declared in kg by a");

    assert!(matches!(error, RegistryError::IncompatibleUnits { .. }));
    assert!(!registry.contains("c"));
    assert_eq!(registry.len(), 2);
}

#[test]
fn sum_converts_terms_into_the_declared_unit() {
    let mut registry = Registry::new();
    let a = wrap(
        Callable::new("a", |args: &[Value]| Ok(args[0].clone())).arg("x"),
        WrapOptions::new().units("m").arg_unit("x", "kg"),
    );
    registry.assign("a", a).expect("a registers");
    registry.declare("b(y[cm])[km] = y").expect("b registers");
    registry.assign("c(x,y)[km]", "2*a + 3*b").expect("c registers");

    assert_eq!(arg_unit(&registry, "c", "x").as_deref(), Some("kg"));
    assert_eq!(arg_unit(&registry, "c", "y").as_deref(), Some("cm"));
    assert_close(
        call(&registry, "c", &[3.0, 3.0]).expect("c evaluates"),
        2.0 * 3.0 / 1000.0 + 3.0 * 3.0,
    );
}

#[test]
fn sum_of_different_units_needs_a_declared_unit() {
    let mut registry = registry(&["a(x)[km] = x", "b(y)[m] = y"]);

    let error = registry
        .assign("c(x, y)", "a + b")
        .expect_err("km and m differ");
    assert!(matches!(error, RegistryError::IncompatibleUnits { .. }));
    assert!(!registry.contains("c"));

    registry
        .assign("c(x, y)[m]", "a + b")
        .expect("the declared unit converts both terms");
    assert_eq!(call(&registry, "c", &[1.0, 1.0]), Ok(1001.0));

    registry.assign("d(x)", "a(x) + 2*a(x)").expect("d registers");
    assert_eq!(registry.get("d").expect("d is registered").units(), "km");
    assert_eq!(call(&registry, "d", &[1.0]), Ok(3.0));
}

#[test]
fn nested_units_propagate() {
    let mut registry = registry(&["a(x[s])[km] = x", "b(x[cm])[g] = x"]);

    registry.assign("c", "b(a)").expect("c registers");

    let c = registry.get("c").expect("c is registered");
    assert_eq!(c.units(), "g");
    assert_eq!(arg_unit(&registry, "c", "x").as_deref(), Some("s"));
    assert_close(call(&registry, "c", &[2.0]).expect("c evaluates"), 200_000.0);
}

#[test]
fn dependency_results_convert_into_argument_units() {
    let mut registry = registry(&["a(x[kg])[m] = x", "b(x[cm])[g] = x"]);

    registry.assign("c", "b(a)").expect("c registers");

    assert_eq!(registry.get("c").expect("c is registered").units(), "g");
    assert_eq!(arg_unit(&registry, "c", "x").as_deref(), Some("kg"));

    let a = call(&registry, "a", &[3.0]).expect("a evaluates");
    let b = call(&registry, "b", &[100.0 * a]).expect("b evaluates");
    assert_eq!(call(&registry, "c", &[3.0]), Ok(b));
}

#[test]
fn products_combine_units() {
    let mut registry = registry(&["m[kg] = x", "v[km/s] = y"]);

    registry.assign("p(x,y)", "m*v").expect("p registers");

    let catalog = registry.catalog();
    let catalog = catalog.borrow();
    let units = catalog
        .resolve(&registry.get("p").expect("p is registered").units())
        .expect("units resolve");
    let expected = catalog.resolve("kg*km/s").expect("units resolve");
    assert!(units.dimensionally_eq(&expected));
    assert!(units.numerically_eq(&expected));
}

#[test]
fn powers_raise_units() {
    let mut registry = registry(&["f(x)[m] = x"]);

    registry.declare("g(x) = f**2").expect("g registers");
    let catalog = registry.catalog();
    let units = catalog
        .borrow()
        .resolve(&registry.get("g").expect("g is registered").units())
        .expect("units resolve");
    let square_meter = catalog.borrow().resolve("m^2").expect("units resolve");
    assert!(units.dimensionally_eq(&square_meter));

    let error = registry
        .declare("h(x) = 2**f")
        .expect_err("exponents must be dimensionless");
    assert!(matches!(error, RegistryError::IncompatibleUnits { .. }));
}

#[test]
fn incompatible_output_unit_is_rejected() {
    let mut registry = registry(&["rho[kg/m^3] = x"]);

    let error = registry
        .assign("d[kg]", "rho")
        .expect_err("kg/m^3 is not a mass");

    assert!(matches!(error, RegistryError::IncompatibleUnits { .. }));
    assert!(!registry.contains("d"));
}

#[test]
fn unknown_units_are_reported() {
    let mut registry = Registry::new();

    let error = registry
        .declare("f(x)[furlongz] = x")
        .expect_err("the unit is unknown");
    assert!(matches!(error, RegistryError::UnitNotFound { .. }));

    let error = registry
        .define_unit("myunit", "unregistered units$", 2.0)
        .expect_err("the base is not a unit");
    assert!(matches!(error, RegistryError::UnitNotFound { .. }));
}

#[test]
fn arguments_without_units_have_no_conversion() {
    let registry = registry(&["s(x[km], y[km])[kg] = x + y"]);

    assert_eq!(call(&registry, "s", &[1.0, 2.0]), Ok(3.0));
    assert_eq!(registry.get("s").expect("s is registered").units(), "kg");
}

#[test]
fn callable_units_are_kept() {
    let mut registry = registry(&["X[m] = x"]);
    let v = wrap(
        Callable::new("v", |args: &[Value]| Ok(args[0].clone())).arg("x"),
        WrapOptions::new().units("km/s").arg_unit("x", "m"),
    );

    let registered = registry.assign("v", v.clone()).expect("v registers");
    assert!(registered.ptr_eq(&v));

    registry.assign("speed", "v(X)").expect("speed registers");
    assert_eq!(registry.get("speed").expect("registered").units(), "km/s");

    let error = registry.assign("p[kg]", v).expect_err("km/s is not a mass");
    assert!(matches!(error, RegistryError::IncompatibleUnits { .. }));
    assert!(!registry.contains("p"));
}

#[test]
fn callable_output_is_converted_to_declared_unit() {
    let mut registry = Registry::new();
    let v = wrap(
        Callable::new("v", |args: &[Value]| Ok(args[0].clone())).arg("x"),
        WrapOptions::new().units("km/s"),
    );

    let w = registry.assign("w[m/s]", v).expect("w registers");

    assert_eq!(w.units(), "m/s");
    assert_eq!(call(&registry, "w", &[2.0]), Ok(2000.0));
}

#[test]
fn callable_without_units_takes_declared_units() {
    let mut registry = Registry::new();
    let rho = Callable::new("rho", |args: &[Value]| Ok(args[0].clone())).arg("x");

    let rho = registry.assign("rho[kg/cc]", rho).expect("rho registers");

    assert_eq!(rho.units(), "kg/cc");
}

#[test]
fn method_units_convert_through_composition() {
    let mut registry = Registry::new();
    let density = wrap(
        Callable::new("density", |args: &[Value]| {
            args[0].checked_add(&args[1])?.checked_add(&args[2])
        })
        .arg("alt")
        .arg("lat")
        .arg("lon"),
        WrapOptions::new().units("1/cm^3"),
    );
    registry.assign("rho", density).expect("rho registers");

    registry
        .assign("r(alt, lat, lon)[1/m^3]", "rho")
        .expect("r registers");

    let args = registry
        .signatures()
        .map(|signature| signature.args().to_vec())
        .collect::<Vec<_>>();
    assert_eq!(args[0], args[1]);
    assert_eq!(
        args[0],
        [Symbol::new("alt"), Symbol::new("lat"), Symbol::new("lon")]
    );
    assert_close(call(&registry, "r", &[1.0, 2.0, 3.0]).expect("r evaluates"), 6e6);
}

#[test]
fn custom_units() {
    let mut registry = Registry::new();
    registry
        .define_unit("mykm", "km", 2.0)
        .expect("mykm is defined");

    registry.declare("a(x)[mykm] = x").expect("a registers");
    registry.declare("b(x)[m] = a").expect("b registers");

    assert_close(call(&registry, "b", &[1.0]).expect("b evaluates"), 2000.0);
}
