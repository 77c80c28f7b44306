//! Canonicalization of declarations.
//!
//! Every accepted input form converges on a [`ParsedDeclaration`]: a
//! [`DeclarationHead`] naming the function, its declared arguments and
//! units, plus a body that is either an expression or an implementation.

use std::fmt;

use symreg_expr::{
    ArgDecl, Config as ParserConfig, DeclarationHead, Equation, Expr, Signature, Symbol,
    is_identifier, parse_declaration, parse_expression, parse_key,
};

use crate::{
    error::RegistryError,
    util::strip_math_delimiters,
    wrapper::{Callable, Implementation},
};

/// The left-hand side of an assignment, or a lookup key.
///
/// Every form normalizes to a function name, so `"f"`, `"f( x )"`,
/// `Symbol::new("f")`, `Key::function("f")`, the signature `f(x)` and the
/// application `f(3)` all refer to the same entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// A name or declaration head such as `"rho(x[km])[kg]"`
    Text(String),
    /// A bare symbol
    Symbol(Symbol),
    /// An unapplied function name
    Function(String),
    /// A function applied to symbolic arguments
    Applied(Signature),
    /// A function application with arbitrary arguments, or a symbol
    Expr(Expr),
}

impl Key {
    /// Creates a key for an unapplied function.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    /// The function name this key refers to, if it names one.
    #[must_use]
    pub fn name(&self, config: ParserConfig) -> Option<String> {
        match self {
            Self::Text(text) => text_name(text, config),
            Self::Symbol(symbol) => Some(symbol.name().to_string()),
            Self::Function(name) => Some(name.clone()),
            Self::Applied(signature) => Some(signature.name().to_string()),
            Self::Expr(expr) => expr_name(expr),
        }
    }

    fn head(self, config: ParserConfig) -> Result<DeclarationHead, RegistryError> {
        match self {
            Self::Text(text) => {
                parse_key(&text, Some(config)).map_err(|error| RegistryError::parser(&text, error))
            }
            Self::Symbol(symbol) => Ok(DeclarationHead::bare(symbol.name())),
            Self::Function(name) => Ok(DeclarationHead::bare(name)),
            Self::Applied(signature) => Ok(signature_head(&signature)),
            Self::Expr(expr) => expr_head(&expr),
        }
    }
}

fn text_name(text: &str, config: ParserConfig) -> Option<String> {
    let text = text.trim();
    if is_identifier(text) {
        return Some(text.to_string());
    }

    parse_key(text, Some(config))
        .map(|head| head.name)
        .ok()
        .or_else(|| {
            parse_expression(text, Some(config))
                .ok()
                .as_ref()
                .and_then(expr_name)
        })
}

fn expr_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Symbol(symbol) => Some(symbol.name().to_string()),
        Expr::Call { name, .. } => Some(name.clone()),
        Expr::Number(_) | Expr::Binary { .. } | Expr::Neg(_) => None,
    }
}

fn signature_head(signature: &Signature) -> DeclarationHead {
    if signature.args().is_empty() {
        return DeclarationHead::bare(signature.name());
    }

    DeclarationHead {
        name: signature.name().to_string(),
        args: Some(
            signature
                .args()
                .iter()
                .map(|arg| ArgDecl {
                    name: arg.clone(),
                    unit: None,
                })
                .collect(),
        ),
        unit: None,
    }
}

fn expr_head(expr: &Expr) -> Result<DeclarationHead, RegistryError> {
    let unsupported = || RegistryError::UnsupportedSyntax {
        input: expr.to_string(),
        offset: 0,
    };

    match expr {
        Expr::Symbol(symbol) => Ok(DeclarationHead::bare(symbol.name())),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|arg| match arg {
                    Expr::Symbol(symbol) => Ok(symbol.clone()),
                    Expr::Number(_) | Expr::Call { .. } | Expr::Binary { .. } | Expr::Neg(_) => {
                        Err(unsupported())
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(signature_head(&Signature::new(name.clone(), args)))
        }
        Expr::Number(_) | Expr::Binary { .. } | Expr::Neg(_) => Err(unsupported()),
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Function(name) => write!(f, "{name}"),
            Self::Applied(signature) => write!(f, "{signature}"),
            Self::Expr(expr) => write!(f, "{expr}"),
        }
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Symbol> for Key {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<Signature> for Key {
    fn from(signature: Signature) -> Self {
        Self::Applied(signature)
    }
}

impl From<Expr> for Key {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

/// The right-hand side of an assignment.
#[derive(Debug, Clone)]
pub enum Definition {
    /// An expression in the plain or LaTeX dialect, optionally wrapped in `$`
    Text(String),
    /// A parsed expression
    Expr(Expr),
    /// A native function
    Callable(Implementation),
}

impl From<&str> for Definition {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Definition {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Expr> for Definition {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Implementation> for Definition {
    fn from(implementation: Implementation) -> Self {
        Self::Callable(implementation)
    }
}

impl From<&Implementation> for Definition {
    fn from(implementation: &Implementation) -> Self {
        Self::Callable(implementation.clone())
    }
}

impl From<Callable> for Definition {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable.into())
    }
}

/// A declaration in any of the accepted surface forms.
#[derive(Debug, Clone)]
pub enum DeclarationInput {
    /// A full declaration such as `"rho(x[km])[kg] = x**2"`, optionally
    /// wrapped in `$...$`
    Text(String),
    /// A symbolic equation `lhs = rhs`
    Equation(Equation),
    /// A key paired with a separately supplied definition
    Keyed {
        /// The declaration head
        key: Key,
        /// The definition
        value: Definition,
    },
    /// A native function registered under its own name
    Callable(Implementation),
}

impl DeclarationInput {
    /// Pairs a key with a definition.
    #[must_use]
    pub fn keyed(key: impl Into<Key>, value: impl Into<Definition>) -> Self {
        Self::Keyed {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<&str> for DeclarationInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DeclarationInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Equation> for DeclarationInput {
    fn from(equation: Equation) -> Self {
        Self::Equation(equation)
    }
}

impl From<Implementation> for DeclarationInput {
    fn from(implementation: Implementation) -> Self {
        Self::Callable(implementation)
    }
}

impl<K: Into<Key>, V: Into<Definition>> From<(K, V)> for DeclarationInput {
    fn from((key, value): (K, V)) -> Self {
        Self::keyed(key, value)
    }
}

/// The body of a canonical declaration.
#[derive(Debug, Clone)]
pub enum Body {
    /// A symbolic definition, to be compiled
    Expr(Expr),
    /// A native function, to be wrapped
    Callable(Implementation),
}

/// The canonical form of a declaration.
#[derive(Debug, Clone)]
pub struct ParsedDeclaration {
    /// The declared name, arguments and units
    pub head: DeclarationHead,
    /// The definition
    pub body: Body,
}

/// Canonicalizes a declaration.
///
/// # Errors
///
/// Returns [`RegistryError::UnsupportedSyntax`] for chained assignments
/// and [`RegistryError::Parser`] for any other malformed text.
pub fn parse(input: DeclarationInput, config: ParserConfig) -> Result<ParsedDeclaration, RegistryError> {
    match input {
        DeclarationInput::Text(text) => {
            let declaration = parse_declaration(&text, Some(config))
                .map_err(|error| RegistryError::parser(&text, error))?;
            Ok(ParsedDeclaration {
                head: declaration.head,
                body: Body::Expr(declaration.body),
            })
        }
        DeclarationInput::Equation(equation) => Ok(ParsedDeclaration {
            head: signature_head(&equation.lhs),
            body: Body::Expr(equation.rhs),
        }),
        DeclarationInput::Keyed { key, value } => {
            let head = key.head(config)?;
            let body = match value {
                Definition::Text(text) => {
                    let expr = parse_expression(strip_math_delimiters(&text), Some(config))
                        .map_err(|error| RegistryError::parser(&text, error))?;
                    Body::Expr(expr)
                }
                Definition::Expr(expr) => Body::Expr(expr),
                Definition::Callable(implementation) => Body::Callable(implementation),
            };
            Ok(ParsedDeclaration { head, body })
        }
        DeclarationInput::Callable(implementation) => Ok(ParsedDeclaration {
            head: DeclarationHead::bare(implementation.name()),
            body: Body::Callable(implementation),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symreg_expr::{BinaryOp, Value};

    fn config() -> ParserConfig {
        ParserConfig::new()
    }

    #[test]
    fn every_key_form_names_the_same_function() {
        let keys = [
            Key::from("f"),
            Key::from("f( x )"),
            Key::from(Symbol::new("f")),
            Key::function("f"),
            Key::from(Signature::new("f", vec![Symbol::new("x")])),
            Key::from(Expr::call("f", vec![Expr::Number(3.0)])),
            Key::from("f(3)"),
        ];

        for key in keys {
            assert_eq!(key.name(config()).as_deref(), Some("f"), "{key:?}");
        }

        assert_eq!(Key::from("f**2").name(config()), None);
    }

    #[test]
    fn text_declaration() {
        let parsed = parse("rho(x[km], y[km])[kg] = x + y".into(), config())
            .expect("should parse declaration");

        assert_eq!(parsed.head.name, "rho");
        assert_eq!(parsed.head.unit.as_deref(), Some("kg"));
        assert_eq!(parsed.head.arg_units()[&Symbol::new("y")], "km");
        assert!(matches!(parsed.body, Body::Expr(_)));
    }

    #[test]
    fn keyed_latex_definition() {
        let parsed = parse(DeclarationInput::keyed("f(a,x,b)", "$a^x+b$"), config())
            .expect("should parse declaration");

        assert_eq!(
            parsed.head.signature(),
            Some(Signature::new(
                "f",
                vec![Symbol::new("a"), Symbol::new("x"), Symbol::new("b")]
            ))
        );
        let Body::Expr(expr) = parsed.body else {
            panic!("expected an expression body");
        };
        assert_eq!(expr.to_string(), "a**x + b");
    }

    #[test]
    fn equation_with_no_arguments_infers_them() {
        let equation = Equation::new(
            Signature::nullary("f"),
            Expr::binary(BinaryOp::Pow, Expr::symbol("x"), Expr::Number(2.0)),
        );
        let parsed = parse(equation.into(), config()).expect("should parse equation");

        assert_eq!(parsed.head, DeclarationHead::bare("f"));
    }

    #[test]
    fn callables_use_their_own_name() {
        let f: Implementation = Callable::new("density", |args: &[Value]| Ok(args[0].clone()))
            .arg("alt")
            .into();
        let parsed = parse(f.into(), config()).expect("should accept callable");

        assert_eq!(parsed.head.name, "density");
        assert!(matches!(parsed.body, Body::Callable(_)));
    }

    #[test]
    fn chained_assignments_are_rejected() {
        let error = parse(DeclarationInput::keyed("f(x)=f(cm)=kg", "x"), config())
            .expect_err("key with assignments should fail");
        assert!(matches!(error, RegistryError::UnsupportedSyntax { .. }));

        let error = parse("f(x)=f(cm)=kg=x".into(), config())
            .expect_err("chained declaration should fail");
        assert!(matches!(error, RegistryError::UnsupportedSyntax { .. }));
    }

    #[test]
    fn applied_keys_need_symbolic_arguments() {
        let error = parse(
            DeclarationInput::keyed(Expr::call("f", vec![Expr::Number(3.0)]), "x"),
            config(),
        )
        .expect_err("numeric arguments cannot be declared");
        assert!(matches!(error, RegistryError::UnsupportedSyntax { .. }));
    }
}
