//! Declaration parsing.
//!
//! A declaration names a function, optionally lists its arguments with
//! unit annotations, optionally annotates the result unit, and defines the
//! function with an expression:
//!
//! ```text
//! rho(x[km], y[km])[kg/m^3] = x + y
//! ```
//!
//! The whole declaration may be wrapped in `$...$` or
//! `\begin{equation}...\end{equation}`.

use indexmap::IndexMap;
use nom::{
    Parser as _,
    branch::alt,
    bytes::complete::take_while,
    combinator::{map, opt, value},
    multi::separated_list0,
    sequence::preceded,
};

use crate::{
    error::{ParserError, ParserErrorReason},
    expr::Expr,
    parser::{self, Result, Span, delimited_args, expect, name, symbol},
    symbol::{Signature, Symbol},
};

/// A declared argument with an optional unit annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    /// The argument symbol
    pub name: Symbol,
    /// The unit annotation text, without brackets
    pub unit: Option<String>,
}

/// The left-hand side of a declaration, such as `rho(x[km], y)[kg]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationHead {
    /// The function name
    pub name: String,
    /// The declared arguments, `None` when no parentheses were written
    pub args: Option<Vec<ArgDecl>>,
    /// The result unit annotation text, without brackets
    pub unit: Option<String>,
}

impl DeclarationHead {
    /// Creates a head with only a name.
    #[must_use]
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
            unit: None,
        }
    }

    /// The declared signature, if the arguments were written out.
    #[must_use]
    pub fn signature(&self) -> Option<Signature> {
        self.args.as_ref().map(|args| {
            Signature::new(
                self.name.clone(),
                args.iter().map(|arg| arg.name.clone()).collect(),
            )
        })
    }

    /// The unit annotations of the declared arguments.
    #[must_use]
    pub fn arg_units(&self) -> IndexMap<Symbol, String> {
        self.args
            .iter()
            .flatten()
            .filter_map(|arg| arg.unit.clone().map(|unit| (arg.name.clone(), unit)))
            .collect()
    }
}

/// A complete declaration `head = body`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The declared function
    pub head: DeclarationHead,
    /// The defining expression
    pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper {
    Dollar,
    DoubleDollar,
    Equation,
}

impl Wrapper {
    const fn closing(self) -> &'static str {
        match self {
            Self::Dollar => "$",
            Self::DoubleDollar => "$$",
            Self::Equation => "\\end{equation}",
        }
    }
}

fn wrapper_open(input: Span<'_>) -> Result<'_, Wrapper> {
    alt((
        value(Wrapper::DoubleDollar, symbol("$$")),
        value(Wrapper::Dollar, symbol("$")),
        value(Wrapper::Equation, symbol("\\begin{equation}")),
    ))
    .parse(input)
}

fn unit_annotation(input: Span<'_>) -> Result<'_, String> {
    preceded(
        symbol("["),
        map(
            (
                take_while(|c: char| c != ']' && c != '\n'),
                expect(symbol("]"), ParserErrorReason::UnclosedUnit),
            ),
            |(unit, _): (Span<'_>, Span<'_>)| unit.fragment().trim().to_string(),
        ),
    )
    .parse(input)
}

fn arg_decl(input: Span<'_>) -> Result<'_, ArgDecl> {
    map((name, opt(unit_annotation)), |(name, unit)| ArgDecl {
        name: Symbol::new(name),
        unit,
    })
    .parse(input)
}

fn arg_decls(input: Span<'_>) -> Result<'_, Vec<ArgDecl>> {
    separated_list0(symbol(","), arg_decl).parse(input)
}

/// Parses a declaration head such as `f(x[cm], y)[km]`.
pub fn declaration_head(input: Span<'_>) -> Result<'_, DeclarationHead> {
    map(
        (name, opt(delimited_args(arg_decls)), opt(unit_annotation)),
        |(name, args, unit)| DeclarationHead { name, args, unit },
    )
    .parse(input)
}

fn closing_wrapper(wrapper: Option<Wrapper>) -> impl FnMut(Span<'_>) -> Result<'_, ()> {
    move |input| match wrapper {
        Some(wrapper) => {
            let (rest, _) = expect(symbol(wrapper.closing()), ParserErrorReason::UnclosedDelimiter)
                .parse(input)?;
            Ok((rest, ()))
        }
        None => Ok((input, ())),
    }
}

fn reject_extra_assignment(input: Span<'_>) -> Result<'_, ()> {
    match input.fragment().find('=') {
        Some(index) => Err(nom::Err::Failure(ParserError::new(
            ParserErrorReason::MultipleAssignments,
            input.location_offset() + index,
        ))),
        None => Ok((input, ())),
    }
}

/// Parses a complete declaration, including an optional wrapper.
pub fn declaration(input: Span<'_>) -> Result<'_, Declaration> {
    let (rest, wrapper) = opt(wrapper_open).parse(input)?;
    let (rest, head) = expect(declaration_head, ParserErrorReason::ExpectedSignature).parse(rest)?;
    let (rest, _) = expect(symbol("="), ParserErrorReason::ExpectedAssignment).parse(rest)?;
    let (rest, body) = expect(parser::expr, ParserErrorReason::ExpectedExpression).parse(rest)?;
    let (rest, ()) = reject_extra_assignment(rest)?;
    let (rest, ()) = closing_wrapper(wrapper).parse(rest)?;

    Ok((rest, Declaration { head, body }))
}

/// Parses a declaration head used on its own as an assignment key.
pub fn key(input: Span<'_>) -> Result<'_, DeclarationHead> {
    if let Some(index) = input.fragment().find('=') {
        return Err(nom::Err::Failure(ParserError::new(
            ParserErrorReason::AssignmentInKey,
            input.location_offset() + index,
        )));
    }

    let (rest, wrapper) = opt(wrapper_open).parse(input)?;
    let (rest, head) = expect(declaration_head, ParserErrorReason::ExpectedSignature).parse(rest)?;
    let (rest, ()) = closing_wrapper(wrapper).parse(rest)?;

    Ok((rest, head))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, parse_declaration, parse_key};

    #[test]
    fn full_declaration() {
        let declaration = parse_declaration("rho(x[km], y[km])[kg/m^3] = x + y", None)
            .expect("should parse declaration");

        let head = &declaration.head;
        assert_eq!(head.name, "rho");
        assert_eq!(head.unit.as_deref(), Some("kg/m^3"));
        assert_eq!(
            head.signature(),
            Some(Signature::new(
                "rho",
                vec![Symbol::new("x"), Symbol::new("y")]
            ))
        );
        assert_eq!(head.arg_units()[&Symbol::new("x")], "km");
        assert_eq!(declaration.body.to_string(), "x + y");
    }

    #[test]
    fn bare_declaration() {
        let declaration = parse_declaration("g = f**2", None).expect("should parse");
        assert_eq!(declaration.head, DeclarationHead::bare("g"));
        assert!(declaration.head.signature().is_none());
    }

    #[test]
    fn latex_wrappers() {
        let dollar = parse_declaration("$f(x) = x^{2}$", None).expect("should parse");
        let equation = parse_declaration(
            "\\begin{equation}f{\\left(x \\right)} = x^{2}\\end{equation}",
            None,
        )
        .expect("should parse");
        let plain = parse_declaration("f(x) = x**2", None).expect("should parse");

        assert_eq!(dollar, plain);
        assert_eq!(equation, plain);
    }

    #[test]
    fn unclosed_wrapper() {
        let error = parse_declaration("$f(x) = x", None).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::UnclosedDelimiter);
    }

    #[test]
    fn chained_assignment_is_rejected() {
        let error = parse_declaration("f(x)=f(cm)=kg", None).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::MultipleAssignments);
        assert_eq!(error.offset, 10);

        let error = parse_declaration("f(x[cm])[kg]=f(cm)[kg]=x", None).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::MultipleAssignments);
    }

    #[test]
    fn missing_assignment() {
        let error = parse_declaration("f(x)", None).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::ExpectedAssignment);
    }

    #[test]
    fn keys() {
        let key = parse_key("f( x )", None).expect("should parse key");
        assert_eq!(
            key.signature(),
            Some(Signature::new("f", vec![Symbol::new("x")]))
        );

        let key = parse_key("rho[kg/m^3]", None).expect("should parse key");
        assert_eq!(key.args, None);
        assert_eq!(key.unit.as_deref(), Some("kg/m^3"));

        let error = parse_key("f(x) = x", None).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::AssignmentInKey);
    }

    #[test]
    fn unclosed_unit() {
        let error = parse_key("f(x[cm)", Some(Config::plain())).expect_err("should fail");
        assert_eq!(error.reason, ParserErrorReason::UnclosedUnit);
    }
}
