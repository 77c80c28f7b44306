use indexmap::IndexMap;
use symreg_expr::{Expr, Signature, Symbol, Value};

use super::{call, registry};
use crate::{Callable, Key, Registry, RegistryError, WrapOptions, compose, wrap};

fn x() -> Symbol {
    Symbol::new("x")
}

#[test]
fn every_key_form_finds_the_entry() {
    let registry = registry(&["f(x) = x"]);
    let f = registry.get("f").expect("f is registered");

    let keys = [
        Key::from("f"),
        Key::from("f( x )"),
        Key::from(Symbol::new("f")),
        Key::function("f"),
        Key::from(Signature::new("f", vec![x()])),
        Key::from(Expr::call("f", vec![Expr::Number(3.0)])),
    ];

    for key in keys {
        assert!(registry.contains(key.clone()), "{key} should be found");
        let found = registry.get(key).expect("every key form resolves");
        assert!(found.ptr_eq(&f));
    }

    assert!(!registry.contains("g"));
    assert!(!registry.contains("f**2"));
}

#[test]
fn removal_by_every_key_form() {
    let mut registry = registry(&["f = x", "g = y", "h = y"]);

    registry.remove("f").expect("f is removed");
    assert!(!registry.contains("f"));

    registry.remove(Key::function("g")).expect("g is removed");
    assert!(!registry.contains("g"));

    registry.remove("h(y)").expect("h is removed");
    assert!(!registry.contains("h(y)"));

    assert!(registry.is_empty());
    assert_eq!(registry.signatures().count(), 0);

    let error = registry.remove("y").expect_err("y was never registered");
    assert_eq!(
        error,
        RegistryError::AttributeNotFound {
            name: "y".to_string()
        }
    );
}

#[test]
fn removing_a_dependency_keeps_dependents_working() {
    let mut registry = registry(&["f(x) = x**2", "g(x) = f(x) + 1"]);

    registry.remove("f").expect("f is removed");

    assert_eq!(call(&registry, "g", &[3.0]), Ok(10.0));
}

#[test]
fn attributes_are_shared_with_the_registry() {
    let mut registry = Registry::new();
    let update = Callable::new("x_next", |args: &[Value]| args[0].checked_sub(&args[1]))
        .arg("x")
        .arg("y");
    registry.assign("x_next", update).expect("x_next registers");

    let handle = registry.get("x_next").expect("registered");
    handle.set_attr("update", "x");

    assert_eq!(
        registry.get("x_next").expect("registered").update().as_deref(),
        Some("x")
    );
}

#[test]
fn evaluate_a_registered_function() {
    let mut registry = registry(&["f = x"]);
    let g = Callable::new("g", |args: &[Value]| Ok(args[0].clone())).arg_with_default("x", 3.0);
    registry.assign("g", g).expect("g registers");

    let result = registry
        .evaluate("f", &IndexMap::from([("x", Value::from(3.0))]))
        .expect("f evaluates");
    assert_eq!(result["x"], Value::from(3.0));
    assert_eq!(result["f"], Value::from(3.0));

    let result = registry
        .evaluate::<&str>("g", &IndexMap::new())
        .expect("g evaluates with its default");
    assert_eq!(result["x"], Value::from(3.0));
}

#[test]
fn evaluate_an_inline_declaration() {
    let registry = registry(&["f = x"]);

    let result = registry
        .evaluate("g = f**2", &IndexMap::from([("x", Value::from(3.0))]))
        .expect("g evaluates");

    assert_eq!(result["x"], Value::from(3.0));
    assert_eq!(result["g"], Value::from(9.0));
    assert!(!registry.contains("g"));

    let error = registry
        .evaluate("f**2", &IndexMap::from([("x", Value::from(3.0))]))
        .expect_err("no assignment target");
    assert!(matches!(error, RegistryError::MissingAssignmentTarget { .. }));
}

#[test]
fn evaluate_reports_missing_arguments() {
    let registry = registry(&["f = x"]);

    let error = registry
        .evaluate::<&str>("f", &IndexMap::new())
        .expect_err("x has no default");

    assert!(matches!(error, RegistryError::Eval(_)));
}

#[test]
fn latex_of_a_registry() {
    let registry = registry(&["f = x**2"]);
    assert_eq!(
        registry.to_latex(),
        "\\begin{equation}f{\\left(x \\right)} = x^{2}\\end{equation}"
    );

    let registry = Registry::from_declarations([("f", "x")]).expect("f registers");
    assert_eq!(
        registry.to_latex(),
        "\\begin{equation}f{\\left(x \\right)} = x\\end{equation}"
    );
}

#[test]
fn latex_of_callables() {
    let mut registry = registry(&["f(x[cm])[kg] = x**2"]);
    let g = wrap(
        Callable::new("g", |args: &[Value]| args[0].checked_mul(&args[0])).arg("x"),
        WrapOptions::new()
            .units("kg")
            .arg_unit("x", "cm")
            .equation("$x^2$"),
    );
    registry.assign("g", g).expect("g registers");
    let h = Callable::new("h", |args: &[Value]| Ok(args[0].clone())).arg("y");
    registry.assign("h", h).expect("h registers");

    let latex = registry.to_latex();
    let lines = latex.lines().collect::<Vec<_>>();

    assert_eq!(
        lines,
        [
            "\\begin{equation}f{\\left(x \\right)}[kg] = x^{2}\\end{equation}",
            "\\begin{equation}g{\\left(x \\right)}[kg] = x^2\\end{equation}",
            "\\begin{equation}h{\\left(y \\right)} = \\lambda{\\left(y \\right)}\\end{equation}",
        ]
    );
}

#[test]
fn rendered_latex_declares_the_same_entries() {
    let original = registry(&["f(x)[kg] = x**2 + 1", "g(x, y) = f(x) / y"]);

    let mut reparsed = Registry::new();
    for line in original.to_latex().lines() {
        reparsed.declare(line).expect("rendered equations parse");
    }

    let signatures = |registry: &Registry| registry.signatures().cloned().collect::<Vec<_>>();
    assert_eq!(signatures(&original), signatures(&reparsed));
    for name in ["f", "g"] {
        assert_eq!(
            original.get(name).expect("registered").units(),
            reparsed.get(name).expect("registered").units()
        );
    }
    assert_eq!(call(&reparsed, "g", &[3.0, 2.0]), Ok(5.0));
}

#[test]
fn detail_rows_follow_registry_order() {
    let registry = registry(&["f(x[cm])[kg] = x", "g = f**2"]);

    let detail = registry.detail();

    assert_eq!(detail.rows.len(), 2);
    assert_eq!(detail.rows[0].symbol, "f(x)");
    assert_eq!(detail.rows[0].units, "kg");
    assert_eq!(detail.rows[0].arg_units[&x()], "cm");
    assert_eq!(detail.rows[1].symbol, "g(x)");
    assert_eq!(detail.rows[1].equation, "g{\\left(x \\right)} = f{\\left(x \\right)}^{2}");

    let table = detail.to_string();
    assert!(table.starts_with("symbol"));
    assert_eq!(table.lines().count(), 4);
}

#[test]
fn derive_extends_a_copy() {
    let registry = registry(&["f = x"]);

    let derived = registry.derive(["g = f**2"]).expect("g registers");

    assert_eq!(call(&derived, "g", &[3.0]), Ok(9.0));
    assert!(!registry.contains("g"));
    assert!(
        derived
            .get("f")
            .expect("f is shared")
            .ptr_eq(&registry.get("f").expect("f is registered"))
    );
}

#[test]
fn compose_suffixes_names() {
    let k1 = registry(&["f = x"]);
    let mut k2 = registry(&["g = y**2"]);
    let h = Callable::new("h", |args: &[Value]| {
        args[0].checked_pow(&Value::from(3.0))
    })
    .arg("x");
    k2.assign("h", h).expect("h registers");

    let mut k3 = compose([("m1", &k1), ("m2", &k2)]).expect("names are distinct");

    assert_eq!(k3.keys().collect::<Vec<_>>(), ["f_m1", "g_m2", "h_m2"]);
    assert_eq!(call(&k3, "f_m1", &[3.0]), Ok(3.0));
    assert_eq!(call(&k3, "g_m2", &[3.0]), Ok(9.0));
    assert_eq!(call(&k3, "h_m2", &[3.0]), Ok(27.0));

    k3.assign("h(f_m1)", "f_m1").expect("the argument shadows f_m1");
    assert_eq!(call(&k3, "h", &[3.0]), Ok(3.0));
}

#[test]
fn compose_renames_calls_in_retained_expressions() {
    let k1 = registry(&["f(x) = x", "g(x) = f(x) + 1"]);

    let composed = compose([("m1", &k1)]).expect("names are distinct");

    let expr = composed
        .entry("g_m1")
        .expect("g_m1 is registered")
        .expr()
        .expect("g_m1 is symbolic");
    assert_eq!(expr.to_string(), "f_m1(x) + 1");
}

#[test]
fn registry_simulation() {
    let mut registry = Registry::new();
    let y_next = wrap(
        Callable::new("y_iplus1", |args: &[Value]| args[0].checked_add(&args[1]))
            .arg("y")
            .arg("x"),
        WrapOptions::new().units("cm").attr("update", "y"),
    );
    let x_next = wrap(
        Callable::new("x_iplus1", |args: &[Value]| args[0].checked_sub(&args[1]))
            .arg("x")
            .arg("y"),
        WrapOptions::new().units("m"),
    );
    registry.assign("x_iplus1", x_next).expect("x_iplus1 registers");
    registry.assign("y_iplus1", y_next).expect("y_iplus1 registers");

    registry
        .get("x_iplus1")
        .expect("registered")
        .set_attr("update", "x");
    assert_eq!(
        registry.get("y_iplus1").expect("registered").update().as_deref(),
        Some("y")
    );

    let initial = IndexMap::from([("y", Value::from(1.0)), ("x", Value::from(0.0))]);
    let state = registry
        .simulate(initial, 1)
        .last()
        .expect("one snapshot")
        .expect("the step succeeds");

    assert_eq!(state["x"], Value::from(-1.0));
    assert_eq!(state["y"], Value::from(0.0));
}
