//! Turning canonical declarations into registry entries.
//!
//! A symbolic body is resolved against the registered functions, checked
//! for ambiguity, rewritten so that every unit conversion it implies is an
//! explicit factor, and compiled. A native function is checked against the
//! declared arguments and units and adapted when they differ.

use std::rc::Rc;

use indexmap::IndexMap;
use symreg_expr::{
    BUILTIN_FUNCTIONS, BinaryOp, DeclarationHead, EvalError, Expr, FunctionTable, Signature,
    Symbol, Value, compile, signature_to_latex, to_latex,
};
use symreg_unit::{Unit, UnitCatalog, is_close};

use crate::{
    config::Config,
    error::RegistryError,
    registry::Entry,
    wrapper::{Callable, Implementation, Param, WrapOptions, wrap},
};

/// What a declaration is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub entries: &'a IndexMap<String, Rc<Entry>>,
    pub catalog: &'a UnitCatalog,
    pub config: Config,
}

/// The registered functions a synthesized implementation calls into.
///
/// The handles are captured when the implementation is built, so removing
/// or replacing a dependency later does not change the dependent.
struct Dependencies(IndexMap<String, Implementation>);

impl FunctionTable for Dependencies {
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        self.0
            .get(name)
            .map(|implementation| implementation.call(args))
    }
}

/// Builds the entry for a symbolic declaration.
pub fn synthesize(
    scope: &Scope<'_>,
    head: &DeclarationHead,
    body: &Expr,
) -> Result<Entry, RegistryError> {
    let name = head.name.as_str();
    let declared = head.signature();
    let declared_args = declared.as_ref().map(Signature::args);

    check_distinct_args(name, declared_args)?;
    check_self_reference(name, declared_args, body)?;

    let bindings = bindings(scope, declared_args, body);
    let expr = body.substitute(&bindings);
    if !bindings.is_empty() {
        tracing::trace!(name, %expr, "substituted registered functions");
    }
    check_calls(scope, name, &expr)?;

    let args = match declared_args {
        Some(declared_args) => {
            let undeclared = expr
                .free_symbols()
                .into_iter()
                .filter(|symbol| !declared_args.contains(symbol))
                .map(|symbol| format!("`{symbol}`"))
                .collect::<Vec<_>>();
            if !undeclared.is_empty() {
                return Err(RegistryError::ambiguous(
                    name,
                    format!(
                        "{} not among the declared arguments",
                        undeclared.join(", ")
                    ),
                ));
            }
            declared_args.to_vec()
        }
        None => expr.free_symbols().into_iter().collect(),
    };
    let signature = Signature::new(name, args.clone());

    let catalog = scope.catalog;
    let declared_unit = head
        .unit
        .as_deref()
        .map(|unit| catalog.resolve(unit))
        .transpose()?;
    let declared_arg_units = head
        .args
        .iter()
        .flatten()
        .filter_map(|arg| {
            arg.unit
                .as_deref()
                .map(|unit| catalog.resolve(unit).map(|unit| (arg.name.clone(), unit)))
        })
        .collect::<Result<IndexMap<_, _>, _>>()?;

    let mut propagation = UnitPropagation {
        scope: *scope,
        declared: &declared_arg_units,
        bound: IndexMap::new(),
    };
    let (converted, natural_unit) = propagation.rewrite(&expr, declared_unit.as_ref())?;
    let converted = match (&natural_unit, &declared_unit) {
        (Some(natural_unit), Some(declared_unit)) => {
            propagation.convert(converted, natural_unit, declared_unit)?
        }
        _ => converted,
    };

    let units = match (&head.unit, &natural_unit) {
        (Some(declared), _) => declared.trim().to_string(),
        (None, Some(natural_unit)) => catalog.abbreviate(natural_unit),
        (None, None) => String::new(),
    };
    let declared_arg_text = head.arg_units();
    let arg_units = args
        .iter()
        .filter_map(|arg| {
            declared_arg_text
                .get(arg)
                .map(|unit| unit.trim().to_string())
                .or_else(|| propagation.bound.get(arg).map(|unit| catalog.abbreviate(unit)))
                .map(|unit| (arg.clone(), unit))
        })
        .collect::<IndexMap<_, _>>();

    let defaults = inherited_defaults(scope, &converted);
    let dependencies = Dependencies(
        converted
            .calls()
            .into_iter()
            .filter_map(|(callee, _)| {
                scope
                    .entries
                    .get(callee)
                    .map(|entry| (callee.to_string(), entry.implementation().clone()))
            })
            .collect(),
    );

    let compiled = compile(converted, args.clone());
    let function = move |values: &[Value]| compiled.eval(values, &dependencies);
    let callable = args
        .iter()
        .fold(Callable::new(name, function), |callable, arg| {
            match defaults.get(arg) {
                Some(default) => callable.arg_with_default(arg.clone(), default.clone()),
                None => callable.arg(arg.clone()),
            }
        });

    let equation = format!("{} = {}", signature_to_latex(&signature), to_latex(&expr));
    let mut options = WrapOptions::new().units(units).equation(equation);
    for (arg, unit) in arg_units {
        options = options.arg_unit(arg, unit);
    }
    if !scope.config.sample_data {
        options = options.without_sample_data();
    }

    Ok(Entry::new(signature, wrap(callable, options), Some(expr)))
}

fn check_distinct_args(name: &str, declared_args: Option<&[Symbol]>) -> Result<(), RegistryError> {
    let Some(args) = declared_args else {
        return Ok(());
    };

    for (index, arg) in args.iter().enumerate() {
        if args[..index].contains(arg) {
            return Err(RegistryError::ambiguous(
                name,
                format!("the argument `{arg}` is declared more than once"),
            ));
        }
    }

    Ok(())
}

fn check_self_reference(
    name: &str,
    declared_args: Option<&[Symbol]>,
    body: &Expr,
) -> Result<(), RegistryError> {
    let shadowed = declared_args.is_some_and(|args| args.iter().any(|arg| arg.name() == name));
    let called = body.calls().iter().any(|(callee, _)| *callee == name);
    let referenced = !shadowed && body.free_symbols().iter().any(|symbol| symbol.name() == name);

    if called || referenced {
        return Err(RegistryError::ambiguous(
            name,
            "the definition refers to the name being defined",
        ));
    }

    Ok(())
}

/// Maps every free symbol naming a registered function to that function's
/// signature. Declared arguments shadow registered names.
fn bindings(
    scope: &Scope<'_>,
    declared_args: Option<&[Symbol]>,
    body: &Expr,
) -> IndexMap<Symbol, Signature> {
    body.free_symbols()
        .into_iter()
        .filter(|symbol| !declared_args.is_some_and(|args| args.contains(symbol)))
        .filter_map(|symbol| {
            scope
                .entries
                .get(symbol.name())
                .map(|entry| (symbol, entry.signature().clone()))
        })
        .collect()
}

fn check_calls(scope: &Scope<'_>, name: &str, expr: &Expr) -> Result<(), RegistryError> {
    for (callee, arity) in expr.calls() {
        match scope.entries.get(callee) {
            Some(entry) => {
                if !entry.implementation().accepts(arity) {
                    return Err(RegistryError::ambiguous(
                        name,
                        format!(
                            "`{}` is registered with {} argument(s) but applied to {arity}",
                            entry.signature(),
                            entry.signature().args().len()
                        ),
                    ));
                }
            }
            None if BUILTIN_FUNCTIONS.contains(&callee) => {
                if arity != 1 {
                    return Err(RegistryError::ambiguous(
                        name,
                        format!("builtin `{callee}` takes 1 argument but is applied to {arity}"),
                    ));
                }
            }
            None => {
                return Err(RegistryError::UndefinedFunction {
                    name: callee.to_string(),
                });
            }
        }
    }

    Ok(())
}

fn visit_calls<'a>(expr: &'a Expr, visit: &mut impl FnMut(&'a str, &'a [Expr])) {
    match expr {
        Expr::Number(_) | Expr::Symbol(_) => {}
        Expr::Call { name, args } => {
            visit(name, args);
            for arg in args {
                visit_calls(arg, visit);
            }
        }
        Expr::Binary { left, right, .. } => {
            visit_calls(left, visit);
            visit_calls(right, visit);
        }
        Expr::Neg(inner) => visit_calls(inner, visit),
    }
}

/// An argument passed unchanged to a dependency parameter that has a
/// default inherits that default. The first such parameter wins.
fn inherited_defaults(scope: &Scope<'_>, expr: &Expr) -> IndexMap<Symbol, Value> {
    let mut defaults = IndexMap::new();

    visit_calls(expr, &mut |callee, args| {
        let Some(entry) = scope.entries.get(callee) else {
            return;
        };

        for (param, arg) in entry.implementation().params().iter().zip(args) {
            if let (Expr::Symbol(symbol), Some(default)) = (arg, &param.default) {
                defaults
                    .entry(symbol.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    });

    defaults
}

/// Tracks units through an expression and rewrites it so that every
/// conversion is an explicit factor.
///
/// Units come from registered functions only: a plain argument symbol or a
/// number carries no unit of its own. `+` and `-` convert their terms into
/// the declared target unit, and without one their terms must share a unit.
/// `*`, `/` and `**` combine units.
struct UnitPropagation<'s, 'a> {
    scope: Scope<'a>,
    /// Units declared on the arguments of the new function
    declared: &'s IndexMap<Symbol, Unit>,
    /// Units bound to undeclared arguments by the first dependency they are
    /// passed to
    bound: IndexMap<Symbol, Unit>,
}

impl UnitPropagation<'_, '_> {
    fn rewrite(
        &mut self,
        expr: &Expr,
        target: Option<&Unit>,
    ) -> Result<(Expr, Option<Unit>), RegistryError> {
        match expr {
            Expr::Number(_) | Expr::Symbol(_) => Ok((expr.clone(), None)),
            Expr::Neg(inner) => {
                let (inner, unit) = self.rewrite(inner, target)?;
                Ok((Expr::neg(inner), unit))
            }
            Expr::Binary { op, left, right } => self.rewrite_binary(*op, left, right, target),
            Expr::Call { name, args } => {
                let entries = self.scope.entries;
                match entries.get(name) {
                    Some(entry) => self.rewrite_dependency(name, entry, args),
                    None => {
                        let args = args
                            .iter()
                            .map(|arg| self.rewrite(arg, None).map(|(arg, _)| arg))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok((Expr::call(name.clone(), args), None))
                    }
                }
            }
        }
    }

    fn rewrite_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        target: Option<&Unit>,
    ) -> Result<(Expr, Option<Unit>), RegistryError> {
        match op {
            BinaryOp::Add | BinaryOp::Sub => {
                let (left, left_unit) = self.rewrite(left, target)?;
                let (right, right_unit) = self.rewrite(right, target)?;

                if let Some(target) = target {
                    let left = self.convert_from(left, left_unit.as_ref(), target)?;
                    let right = self.convert_from(right, right_unit.as_ref(), target)?;
                    return Ok((Expr::binary(op, left, right), Some(target.clone())));
                }

                // without a declared unit the terms must already agree
                if let (Some(left_unit), Some(right_unit)) = (&left_unit, &right_unit) {
                    let catalog = self.scope.catalog;
                    let factor = catalog.conversion_factor(right_unit, left_unit)?;
                    if !is_close(factor, 1.0) {
                        return Err(RegistryError::IncompatibleUnits {
                            from: catalog.abbreviate(right_unit),
                            to: catalog.abbreviate(left_unit),
                        });
                    }
                }

                let unit = left_unit.or(right_unit);
                Ok((Expr::binary(op, left, right), unit))
            }
            BinaryOp::Mul => {
                let (left, left_unit) = self.rewrite(left, None)?;
                let (right, right_unit) = self.rewrite(right, None)?;

                let unit = match (left_unit, right_unit) {
                    (Some(left_unit), Some(right_unit)) => Some(left_unit * right_unit),
                    (Some(unit), None) | (None, Some(unit)) => Some(unit),
                    (None, None) => None,
                };

                Ok((Expr::binary(op, left, right), unit))
            }
            BinaryOp::Div => {
                let (left, left_unit) = self.rewrite(left, None)?;
                let (right, right_unit) = self.rewrite(right, None)?;

                let unit = match (left_unit, right_unit) {
                    (Some(left_unit), Some(right_unit)) => Some(left_unit / right_unit),
                    (Some(left_unit), None) => Some(left_unit),
                    (None, Some(right_unit)) => Some(Unit::unitless() / right_unit),
                    (None, None) => None,
                };

                Ok((Expr::binary(op, left, right), unit))
            }
            BinaryOp::Pow => {
                let (base, base_unit) = self.rewrite(left, None)?;
                let (exponent, exponent_unit) = self.rewrite(right, None)?;

                if let Some(exponent_unit) = exponent_unit.filter(|unit| !unit.is_unitless()) {
                    return Err(self.not_dimensionless(&exponent_unit));
                }

                let unit = match base_unit {
                    Some(base_unit) => match exponent.constant_value() {
                        Some(power) => Some(base_unit.pow(power)),
                        None => return Err(self.not_dimensionless(&base_unit)),
                    },
                    None => None,
                };

                Ok((Expr::binary(op, base, exponent), unit))
            }
        }
    }

    fn rewrite_dependency(
        &mut self,
        name: &str,
        entry: &Entry,
        args: &[Expr],
    ) -> Result<(Expr, Option<Unit>), RegistryError> {
        let catalog = self.scope.catalog;
        let param_units = entry.implementation().arg_units();

        let mut converted = Vec::with_capacity(args.len());
        for (param, arg) in entry.signature().args().iter().zip(args) {
            let (arg_expr, arg_unit) = self.rewrite(arg, None)?;
            let param_unit = param_units
                .get(param)
                .map(|unit| catalog.resolve(unit))
                .transpose()?;

            let arg_expr = match (param_unit, arg_unit) {
                (Some(param_unit), Some(arg_unit)) => {
                    self.convert(arg_expr, &arg_unit, &param_unit)?
                }
                (Some(param_unit), None) => {
                    if let Expr::Symbol(symbol) = arg {
                        self.bind_argument(symbol, arg_expr, param_unit)?
                    } else {
                        arg_expr
                    }
                }
                (None, _) => arg_expr,
            };
            converted.push(arg_expr);
        }

        let units = entry.implementation().units();
        let unit = if units.trim().is_empty() {
            None
        } else {
            Some(catalog.resolve(&units)?)
        };

        Ok((Expr::call(name, converted), unit))
    }

    /// Reconciles an argument symbol with the unit a dependency expects.
    ///
    /// A unit declared on the argument is converted into the expected
    /// unit. Otherwise the first dependency the argument is passed to binds
    /// its unit, and later uses are converted from that unit.
    fn bind_argument(
        &mut self,
        symbol: &Symbol,
        expr: Expr,
        expected: Unit,
    ) -> Result<Expr, RegistryError> {
        if let Some(declared) = self.declared.get(symbol) {
            return self.convert(expr, declared, &expected);
        }

        if let Some(bound) = self.bound.get(symbol) {
            return self.convert(expr, bound, &expected);
        }

        self.bound.insert(symbol.clone(), expected);
        Ok(expr)
    }

    fn convert(&self, expr: Expr, from: &Unit, to: &Unit) -> Result<Expr, RegistryError> {
        let catalog = self.scope.catalog;
        let factor = catalog.conversion_factor(from, to)?;
        if is_close(factor, 1.0) {
            return Ok(expr);
        }

        tracing::trace!(
            from = %catalog.abbreviate(from),
            to = %catalog.abbreviate(to),
            factor,
            "folding conversion factor"
        );
        Ok(Expr::binary(BinaryOp::Mul, expr, Expr::Number(factor)))
    }

    fn convert_from(
        &self,
        expr: Expr,
        from: Option<&Unit>,
        to: &Unit,
    ) -> Result<Expr, RegistryError> {
        match from {
            Some(from) => self.convert(expr, from, to),
            None => Ok(expr),
        }
    }

    fn not_dimensionless(&self, unit: &Unit) -> RegistryError {
        RegistryError::IncompatibleUnits {
            from: self.scope.catalog.abbreviate(unit),
            to: "1".to_string(),
        }
    }
}

/// Builds the entry for a native function.
///
/// Declared arguments must name exactly the function's parameters; their
/// order becomes the calling order. A declared result unit or argument unit
/// that differs from the function's own metadata but is compatible with it
/// is handled by scaling the result or the argument.
pub fn adapt_callable(
    scope: &Scope<'_>,
    head: &DeclarationHead,
    implementation: Implementation,
) -> Result<Entry, RegistryError> {
    let name = head.name.as_str();
    let catalog = scope.catalog;
    let params = implementation.params().to_vec();

    let declared_args = head
        .signature()
        .map_or_else(|| implementation.arg_names(), |signature| signature.args().to_vec());
    check_distinct_args(name, Some(&declared_args))?;
    let positions = argument_positions(name, &declared_args, &params)?;
    let reordered = positions
        .iter()
        .enumerate()
        .any(|(index, position)| index != *position);

    let own_units = implementation.units();
    let output_factor = match head.unit.as_deref() {
        Some(declared) if !own_units.trim().is_empty() => {
            let factor =
                catalog.conversion_factor(&catalog.resolve(&own_units)?, &catalog.resolve(declared)?)?;
            (!is_close(factor, 1.0)).then_some(factor)
        }
        Some(_) | None => None,
    };

    let own_arg_units = implementation.arg_units();
    let declared_arg_units = head.arg_units();
    let input_factors = params
        .iter()
        .map(|param| -> Result<Option<f64>, RegistryError> {
            match (declared_arg_units.get(&param.name), own_arg_units.get(&param.name)) {
                (Some(declared), Some(expected)) => {
                    let factor = catalog
                        .conversion_factor(&catalog.resolve(declared)?, &catalog.resolve(expected)?)?;
                    Ok((!is_close(factor, 1.0)).then_some(factor))
                }
                (Some(_), None) | (None, _) => Ok(None),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let units_changed = head
        .unit
        .as_deref()
        .is_some_and(|declared| declared.trim() != own_units);
    let arg_units_changed = declared_arg_units
        .iter()
        .any(|(arg, unit)| own_arg_units.get(arg) != Some(unit));
    let function_changed =
        reordered || output_factor.is_some() || input_factors.iter().any(Option::is_some);

    let signature = Signature::new(name, declared_args.clone());
    if !units_changed && !arg_units_changed && !function_changed {
        return Ok(Entry::new(signature, implementation, None));
    }

    let base = if function_changed {
        let reordered_params = declared_args
            .iter()
            .filter_map(|arg| params.iter().find(|param| param.name == *arg).cloned())
            .collect::<Vec<Param>>();

        let inner = implementation.clone();
        let adapter = move |values: &[Value]| -> Result<Value, EvalError> {
            let args = positions
                .iter()
                .zip(&input_factors)
                .map(|(position, factor)| -> Result<Value, EvalError> {
                    let value = values.get(*position).cloned().ok_or_else(|| {
                        EvalError::ArgumentCount {
                            name: inner.name().to_string(),
                            expected: positions.len(),
                            found: values.len(),
                        }
                    })?;
                    Ok(match factor {
                        Some(factor) => value.scale(*factor),
                        None => value,
                    })
                })
                .collect::<Result<Vec<_>, EvalError>>()?;

            let result = inner.call(&args)?;
            Ok(match output_factor {
                Some(factor) => result.scale(factor),
                None => result,
            })
        };

        implementation.with_function(reordered_params, Rc::new(adapter))
    } else {
        implementation
    };

    let mut options = WrapOptions::new();
    if let Some(units) = &head.unit {
        options = options.units(units.trim());
    }
    for (arg, unit) in declared_arg_units {
        options = options.arg_unit(arg, unit);
    }
    if !scope.config.sample_data {
        options = options.without_sample_data();
    }

    Ok(Entry::new(signature, wrap(base, options), None))
}

/// For each parameter, the position of the declared argument that feeds it.
fn argument_positions(
    name: &str,
    declared: &[Symbol],
    params: &[Param],
) -> Result<Vec<usize>, RegistryError> {
    let mismatch = || {
        let params = params
            .iter()
            .map(|param| param.name.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        RegistryError::ambiguous(
            name,
            format!("declared arguments do not match the parameters ({params})"),
        )
    };

    if declared.len() != params.len() {
        return Err(mismatch());
    }

    let positions = params
        .iter()
        .map(|param| declared.iter().position(|arg| *arg == param.name))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(mismatch)?;

    let mut distinct = positions.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() != positions.len() {
        return Err(mismatch());
    }

    Ok(positions)
}
