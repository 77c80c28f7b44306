use std::{borrow::Borrow, fmt};

use crate::expr::Expr;

/// An atomic named entity such as `x` or `rho`.
///
/// Two symbols are the same symbol if and only if they have the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name of the symbol.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A symbolic function application such as `f(x, y)`.
///
/// The order of the arguments is the calling convention of the function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: String,
    args: Vec<Symbol>,
}

impl Signature {
    /// Creates a signature from a function name and its ordered arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Symbol>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Creates a signature with no arguments.
    #[must_use]
    pub fn nullary(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ordered arguments.
    #[must_use]
    pub fn args(&self) -> &[Symbol] {
        &self.args
    }

    /// Returns the signature as an applied call expression.
    #[must_use]
    pub fn to_call(&self) -> Expr {
        Expr::call(
            self.name.clone(),
            self.args.iter().cloned().map(Expr::Symbol).collect(),
        )
    }

    /// Returns a copy of this signature under a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.args.clone())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }

        let args = self
            .args
            .iter()
            .map(Symbol::name)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({args})")
    }
}

/// A symbolic equation `lhs = rhs` whose left side is a function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    /// The function being defined
    pub lhs: Signature,
    /// The defining expression
    pub rhs: Expr,
}

impl Equation {
    /// Creates a new equation.
    #[must_use]
    pub const fn new(lhs: Signature, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_display() {
        let signature = Signature::new("rho", vec![Symbol::new("x"), Symbol::new("y")]);
        assert_eq!(signature.to_string(), "rho(x, y)");
        assert_eq!(Signature::nullary("c").to_string(), "c");
    }

    #[test]
    fn argument_order_is_significant() {
        let xy = Signature::new("f", vec![Symbol::new("x"), Symbol::new("y")]);
        let yx = Signature::new("f", vec![Symbol::new("y"), Symbol::new("x")]);
        assert_ne!(xy, yx);
    }

    #[test]
    fn equation_display() {
        let equation = Equation::new(
            Signature::new("f", vec![Symbol::new("x")]),
            Expr::binary(
                crate::BinaryOp::Pow,
                Expr::symbol("x"),
                Expr::Number(2.0),
            ),
        );
        assert_eq!(equation.to_string(), "f(x) = x**2");
    }
}
