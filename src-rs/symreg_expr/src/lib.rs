//! Symbolic expressions for symreg.
//!
//! This crate is the computer-algebra layer the registry is built on. It
//! provides four operations:
//!
//! - parsing expressions and declarations ([`parse_expression`],
//!   [`parse_declaration`], [`parse_key`]), in a plain dialect
//!   (`x**2 + f(x)`) and a LaTeX dialect (`x^{2} + f{\left(x \right)}`)
//! - querying free symbols ([`Expr::free_symbols`]) and substituting
//!   symbols with function applications ([`Expr::substitute`])
//! - compiling an expression against ordered arguments into something
//!   that evaluates numerically ([`compile`])
//! - rendering expressions as LaTeX ([`to_latex`])

mod builtin;
mod compile;
mod config;
mod declaration;
mod error;
mod expr;
mod latex;
mod parser;
mod symbol;
mod value;

pub use builtin::{FUNCTIONS as BUILTIN_FUNCTIONS, constant as builtin_constant};
pub use compile::{CompiledExpr, FunctionTable, compile, evaluate};
pub use config::Config;
pub use declaration::{ArgDecl, Declaration, DeclarationHead};
pub use error::{EvalError, ParserError, ParserErrorReason};
pub use expr::{BinaryOp, Expr};
pub use latex::{lambda_to_latex, name_to_latex, signature_to_latex, to_latex};
pub use symbol::{Equation, Signature, Symbol};
pub use value::Value;

use nom::{Parser as _, character::complete::multispace0, combinator::all_consuming, sequence::preceded};
use parser::{Result as InternalResult, Span};

/// Parses an expression such as `x**2 + f(x)`.
///
/// # Errors
///
/// Returns an error if the input is not a complete, valid expression.
pub fn parse_expression(input: &str, config: Option<Config>) -> Result<Expr, ParserError> {
    parse(input, config, parser::expr)
}

/// Parses a declaration such as `rho(x[km], y[km])[kg] = x + y`.
///
/// # Errors
///
/// Returns an error if the input is not a valid declaration, including
/// when it contains more than one `=`.
pub fn parse_declaration(input: &str, config: Option<Config>) -> Result<Declaration, ParserError> {
    parse(input, config, declaration::declaration)
}

/// Parses an assignment key such as `f(x)`, `f( x )` or `rho[kg/m^3]`.
///
/// # Errors
///
/// Returns an error if the input is not a valid declaration head or
/// contains an `=`.
pub fn parse_key(input: &str, config: Option<Config>) -> Result<DeclarationHead, ParserError> {
    parse(input, config, declaration::key)
}

/// Checks whether `name` is a plain identifier usable as a function or
/// symbol name.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    parse(name, Some(Config::plain()), parser::name).is_ok_and(|parsed| parsed == name)
}

fn parse<T>(
    input: &str,
    config: Option<Config>,
    parser: impl Fn(Span<'_>) -> InternalResult<'_, T>,
) -> Result<T, ParserError> {
    let config = config.unwrap_or_default();
    let span = Span::new_extra(input, config);

    match all_consuming(preceded(multispace0, parser)).parse(span) {
        Ok((_rest, parsed)) => Ok(parsed),
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) => Err(error),
        Err(nom::Err::Incomplete(_needed)) => Err(ParserError::new(
            ParserErrorReason::Nom(nom::error::ErrorKind::Complete),
            input.len(),
        )),
    }
}
