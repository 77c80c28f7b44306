//! Builtin constants and math functions available in every expression.

use crate::{error::EvalError, value::Value};

/// The builtin unary math functions:
/// - `sin`, `cos`, `tan` - trigonometric functions
/// - `asin`, `acos`, `atan` - inverse trigonometric functions
/// - `sinh`, `cosh`, `tanh` - hyperbolic functions
/// - `exp` - exponential
/// - `log`, `ln` - natural logarithm
/// - `log10` - base 10 logarithm
/// - `sqrt` - square root
/// - `abs` - absolute value
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "exp", "log", "ln",
    "log10", "sqrt", "abs",
];

/// Checks whether `name` is a builtin function.
#[must_use]
pub fn is_function(name: &str) -> bool {
    FUNCTIONS.contains(&name)
}

/// Returns the value of a builtin constant.
#[must_use]
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        _ => None,
    }
}

fn unary(name: &str) -> Option<fn(f64) -> f64> {
    let function: fn(f64) -> f64 = match name {
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "asin" => f64::asin,
        "acos" => f64::acos,
        "atan" => f64::atan,
        "sinh" => f64::sinh,
        "cosh" => f64::cosh,
        "tanh" => f64::tanh,
        "exp" => f64::exp,
        "log" | "ln" => f64::ln,
        "log10" => f64::log10,
        "sqrt" => f64::sqrt,
        "abs" => f64::abs,
        _ => return None,
    };
    Some(function)
}

/// Calls a builtin function.
///
/// Returns `None` if `name` is not a builtin function.
#[must_use]
pub fn call(name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
    let function = unary(name)?;

    let result = match args {
        [arg] => Ok(arg.map(function)),
        _ => Err(EvalError::ArgumentCount {
            name: name.to_string(),
            expected: 1,
            found: args.len(),
        }),
    };

    Some(result)
}
