use std::{collections::BTreeSet, fmt};

use indexmap::IndexMap;

use crate::{
    builtin,
    symbol::{Signature, Symbol},
};

/// A binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// `a ** b`
    Pow,
}

impl BinaryOp {
    const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
            Self::Pow => 4,
        }
    }

    const fn plain_operator(self) -> &'static str {
        match self {
            Self::Add => " + ",
            Self::Sub => " - ",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "**",
        }
    }
}

const NEG_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal
    Number(f64),
    /// A free symbol
    Symbol(Symbol),
    /// An applied function, either registered or builtin
    Call {
        /// The function name
        name: String,
        /// The argument expressions
        args: Vec<Expr>,
    },
    /// A binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// The left operand
        left: Box<Expr>,
        /// The right operand
        right: Box<Expr>,
    },
    /// A negation
    Neg(Box<Expr>),
}

impl Expr {
    /// Creates a symbol expression.
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(Symbol::new(name))
    }

    /// Creates a function application.
    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    /// Creates a binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a negation.
    #[must_use]
    pub fn neg(expr: Self) -> Self {
        Self::Neg(Box::new(expr))
    }

    /// Returns the free symbols of the expression.
    ///
    /// Builtin constants such as `pi` are not free symbols, and neither are
    /// the names of applied functions.
    #[must_use]
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<Symbol>) {
        match self {
            Self::Number(_) => {}
            Self::Symbol(symbol) => {
                if builtin::constant(symbol.name()).is_none() {
                    symbols.insert(symbol.clone());
                }
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_symbols(symbols);
                }
            }
            Self::Binary { left, right, .. } => {
                left.collect_symbols(symbols);
                right.collect_symbols(symbols);
            }
            Self::Neg(expr) => expr.collect_symbols(symbols),
        }
    }

    /// Returns every function application in the expression as a
    /// `(name, arity)` pair, outermost first.
    #[must_use]
    pub fn calls(&self) -> Vec<(&str, usize)> {
        let mut calls = Vec::new();
        self.collect_calls(&mut calls);
        calls
    }

    fn collect_calls<'a>(&'a self, calls: &mut Vec<(&'a str, usize)>) {
        match self {
            Self::Number(_) | Self::Symbol(_) => {}
            Self::Call { name, args } => {
                calls.push((name.as_str(), args.len()));
                for arg in args {
                    arg.collect_calls(calls);
                }
            }
            Self::Binary { left, right, .. } => {
                left.collect_calls(calls);
                right.collect_calls(calls);
            }
            Self::Neg(expr) => expr.collect_calls(calls),
        }
    }

    /// Checks whether `name` appears as a symbol or as an applied function.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Symbol(symbol) => symbol.name() == name,
            Self::Call { name: callee, args } => {
                callee == name || args.iter().any(|arg| arg.references(name))
            }
            Self::Binary { left, right, .. } => left.references(name) || right.references(name),
            Self::Neg(expr) => expr.references(name),
        }
    }

    /// Replaces every free symbol named in `bindings` with the application
    /// of its signature, returning a new expression.
    ///
    /// For example, substituting `f -> f(x)` into `f**2 + x` yields
    /// `f(x)**2 + x`. Function applications are never renamed.
    #[must_use]
    pub fn substitute(&self, bindings: &IndexMap<Symbol, Signature>) -> Self {
        match self {
            Self::Number(_) => self.clone(),
            Self::Symbol(symbol) => bindings
                .get(symbol)
                .map_or_else(|| self.clone(), Signature::to_call),
            Self::Call { name, args } => Self::Call {
                name: name.clone(),
                args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
            },
            Self::Binary { op, left, right } => {
                Self::binary(*op, left.substitute(bindings), right.substitute(bindings))
            }
            Self::Neg(expr) => Self::neg(expr.substitute(bindings)),
        }
    }

    /// Renames applied functions according to `renames`, leaving symbols
    /// untouched.
    #[must_use]
    pub fn rename_calls(&self, renames: &IndexMap<String, String>) -> Self {
        match self {
            Self::Number(_) | Self::Symbol(_) => self.clone(),
            Self::Call { name, args } => Self::Call {
                name: renames.get(name).unwrap_or(name).clone(),
                args: args.iter().map(|arg| arg.rename_calls(renames)).collect(),
            },
            Self::Binary { op, left, right } => {
                Self::binary(*op, left.rename_calls(renames), right.rename_calls(renames))
            }
            Self::Neg(expr) => Self::neg(expr.rename_calls(renames)),
        }
    }

    /// Evaluates the expression if it does not depend on any symbol or
    /// function other than builtin constants.
    #[must_use]
    pub fn constant_value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Symbol(symbol) => builtin::constant(symbol.name()),
            Self::Call { .. } => None,
            Self::Binary { op, left, right } => {
                let left = left.constant_value()?;
                let right = right.constant_value()?;
                Some(match op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div => left / right,
                    BinaryOp::Pow => left.powf(right),
                })
            }
            Self::Neg(expr) => expr.constant_value().map(|value| -value),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Number(value) if value.is_sign_negative() => NEG_PRECEDENCE,
            Self::Number(_) | Self::Symbol(_) | Self::Call { .. } => ATOM_PRECEDENCE,
            Self::Binary { op, .. } => op.precedence(),
            Self::Neg(_) => NEG_PRECEDENCE,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Call { name, args } => {
                let args = args
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{name}({args})")
            }
            Self::Binary { op, left, right } => {
                let precedence = op.precedence();
                let (left_parens, right_parens) = match op {
                    // right associative, and the exponent may be negated
                    BinaryOp::Pow => (
                        left.precedence() <= precedence,
                        right.precedence() < NEG_PRECEDENCE,
                    ),
                    BinaryOp::Sub | BinaryOp::Div => (
                        left.precedence() < precedence,
                        right.precedence() <= precedence,
                    ),
                    BinaryOp::Add | BinaryOp::Mul => (
                        left.precedence() < precedence,
                        right.precedence() < precedence,
                    ),
                };

                write_operand(f, left, left_parens)?;
                write!(f, "{}", op.plain_operator())?;
                write_operand(f, right, right_parens)
            }
            Self::Neg(expr) => {
                write!(f, "-")?;
                write_operand(f, expr, expr.precedence() < NEG_PRECEDENCE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::symbol("x")
    }

    #[test]
    fn free_symbols_skip_constants_and_function_names() {
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::symbol("pi"),
            Expr::call("f", vec![x(), Expr::symbol("y")]),
        );
        let symbols: Vec<_> = expr.free_symbols().into_iter().collect();
        assert_eq!(symbols, vec![Symbol::new("x"), Symbol::new("y")]);
    }

    #[test]
    fn substitute_builds_new_expression() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::binary(BinaryOp::Pow, Expr::symbol("f"), Expr::Number(2.0)),
            x(),
        );
        let bindings = IndexMap::from([(
            Symbol::new("f"),
            Signature::new("f", vec![Symbol::new("x")]),
        )]);

        let substituted = expr.substitute(&bindings);
        assert_eq!(substituted.to_string(), "f(x)**2 + x");
        assert_eq!(expr.to_string(), "f**2 + x");
    }

    #[test]
    fn display_parenthesizes_by_precedence() {
        let sum = Expr::binary(BinaryOp::Add, x(), Expr::Number(1.0));
        let product = Expr::binary(BinaryOp::Mul, sum.clone(), Expr::symbol("y"));
        assert_eq!(product.to_string(), "(x + 1)*y");

        let difference = Expr::binary(BinaryOp::Sub, x(), sum);
        assert_eq!(difference.to_string(), "x - (x + 1)");

        let negated_power = Expr::neg(Expr::binary(BinaryOp::Pow, x(), Expr::Number(2.0)));
        assert_eq!(negated_power.to_string(), "-x**2");

        let inverse = Expr::binary(BinaryOp::Pow, x(), Expr::neg(Expr::Number(1.0)));
        assert_eq!(inverse.to_string(), "x**-1");
    }

    #[test]
    fn constant_folding() {
        let expr = Expr::binary(
            BinaryOp::Div,
            Expr::Number(1.0),
            Expr::binary(BinaryOp::Add, Expr::Number(1.0), Expr::Number(1.0)),
        );
        assert_eq!(expr.constant_value(), Some(0.5));
        assert_eq!(x().constant_value(), None);
    }

    #[test]
    fn calls_and_references() {
        let expr = Expr::call("g", vec![Expr::call("f", vec![x()])]);
        assert_eq!(expr.calls(), vec![("g", 1), ("f", 1)]);
        assert!(expr.references("f"));
        assert!(expr.references("x"));
        assert!(!expr.references("h"));
    }

    #[test]
    fn rename_calls_keeps_symbols() {
        let expr = Expr::binary(
            BinaryOp::Add,
            Expr::call("f", vec![Expr::symbol("f")]),
            Expr::call("sin", vec![x()]),
        );
        let renames = IndexMap::from([("f".to_string(), "f_m1".to_string())]);
        assert_eq!(expr.rename_calls(&renames).to_string(), "f_m1(f) + sin(x)");
    }
}
