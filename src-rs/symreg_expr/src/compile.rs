use indexmap::IndexMap;

use crate::{
    builtin,
    error::EvalError,
    expr::{BinaryOp, Expr},
    symbol::Symbol,
    value::Value,
};

/// Resolves applied functions that are not builtin.
///
/// The compiled expression consults the table before falling back to
/// the builtin math functions, so a table entry shadows a builtin of the
/// same name.
pub trait FunctionTable {
    /// Calls the function `name`.
    ///
    /// Returns `None` if the table does not hold a function of that name.
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>>;
}

impl FunctionTable for () {
    fn call(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, EvalError>> {
        None
    }
}

impl<F> FunctionTable for IndexMap<String, F>
where
    F: Fn(&[Value]) -> Result<Value, EvalError>,
{
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        self.get(name).map(|function| function(args))
    }
}

/// An expression bound to an ordered list of argument symbols.
///
/// Evaluating it binds the argument values positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpr {
    expr: Expr,
    args: Vec<Symbol>,
}

/// Compiles an expression against its ordered arguments.
#[must_use]
pub const fn compile(expr: Expr, args: Vec<Symbol>) -> CompiledExpr {
    CompiledExpr { expr, args }
}

impl CompiledExpr {
    /// The compiled expression.
    #[must_use]
    pub const fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The ordered argument symbols.
    #[must_use]
    pub fn args(&self) -> &[Symbol] {
        &self.args
    }

    /// Evaluates the expression with positional argument values.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values does not match the number
    /// of arguments, or if evaluation itself fails.
    pub fn eval(&self, values: &[Value], functions: &impl FunctionTable) -> Result<Value, EvalError> {
        if values.len() != self.args.len() {
            return Err(EvalError::ArgumentCount {
                name: self.expr.to_string(),
                expected: self.args.len(),
                found: values.len(),
            });
        }

        let env: IndexMap<&str, &Value> = self
            .args
            .iter()
            .map(Symbol::name)
            .zip(values)
            .collect();

        eval_expr(&self.expr, &env, functions)
    }
}

/// Evaluates an expression with named symbol values.
///
/// # Errors
///
/// Returns an error if a symbol has no value, a function is unknown, or
/// an operation fails.
pub fn evaluate(
    expr: &Expr,
    values: &IndexMap<Symbol, Value>,
    functions: &impl FunctionTable,
) -> Result<Value, EvalError> {
    let env: IndexMap<&str, &Value> = values
        .iter()
        .map(|(symbol, value)| (symbol.name(), value))
        .collect();

    eval_expr(expr, &env, functions)
}

fn eval_expr(
    expr: &Expr,
    env: &IndexMap<&str, &Value>,
    functions: &impl FunctionTable,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),
        Expr::Symbol(symbol) => env
            .get(symbol.name())
            .map(|value| (*value).clone())
            .or_else(|| builtin::constant(symbol.name()).map(Value::Scalar))
            .ok_or_else(|| EvalError::UnboundSymbol {
                name: symbol.name().to_string(),
            }),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| eval_expr(arg, env, functions))
                .collect::<Result<Vec<_>, _>>()?;

            functions
                .call(name, &args)
                .or_else(|| builtin::call(name, &args))
                .unwrap_or_else(|| Err(EvalError::UnknownFunction { name: name.clone() }))
        }
        Expr::Binary { op, left, right } => {
            let left = eval_expr(left, env, functions)?;
            let right = eval_expr(right, env, functions)?;
            match op {
                BinaryOp::Add => left.checked_add(&right),
                BinaryOp::Sub => left.checked_sub(&right),
                BinaryOp::Mul => left.checked_mul(&right),
                BinaryOp::Div => left.checked_div(&right),
                BinaryOp::Pow => left.checked_pow(&right),
            }
        }
        Expr::Neg(expr) => Ok(eval_expr(expr, env, functions)?.negate()),
    }
}
