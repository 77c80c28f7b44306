//! Unit expression parsing.
//!
//! The grammar accepted here is
//!
//! ```text
//! unit_expr := unit_term (('*' | '/') unit_term)*
//! unit_term := unit_atom (('^' | '**') exponent)?
//! unit_atom := '1' | identifier | '(' unit_expr ')'
//! exponent  := number | '(' number ('/' number)? ')'
//! ```
//!
//! Multiplication and division are left-associative, so `kg/m/s` is
//! `(kg/m)/s`.

use nom::{
    IResult, Parser as _,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value},
    multi::many0,
    sequence::{delimited, preceded, terminated},
};
use nom_locate::LocatedSpan;

use crate::error::UnitError;

type Span<'a> = LocatedSpan<&'a str>;

type Result<'a, O> = IResult<Span<'a>, O>;

/// A parsed, unresolved unit expression.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitExpr {
    /// The unitless `1`
    One,
    /// A unit name such as `km` or `R_E`
    Name(String),
    /// A unit raised to a constant power
    Power {
        /// The base of the power
        base: Box<UnitExpr>,
        /// The exponent
        exponent: f64,
    },
    /// The product of two units
    Multiply(Box<UnitExpr>, Box<UnitExpr>),
    /// The quotient of two units
    Divide(Box<UnitExpr>, Box<UnitExpr>),
}

#[derive(Debug, Clone, Copy)]
enum UnitOp {
    Multiply,
    Divide,
}

/// Parses a complete unit expression.
///
/// # Errors
///
/// Returns [`UnitError::Syntax`] if the input is not a valid unit
/// expression, carrying the offset where parsing stopped.
pub fn parse_unit_expr(input: &str) -> std::result::Result<UnitExpr, UnitError> {
    let span = Span::new(input);

    match all_consuming(ws(unit_expr)).parse(span) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Error(error) | nom::Err::Failure(error)) => Err(UnitError::Syntax {
            input: input.to_string(),
            offset: error.input.location_offset(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(UnitError::Syntax {
            input: input.to_string(),
            offset: input.len(),
        }),
    }
}

/// Checks whether `name` is a valid unit identifier.
#[must_use]
pub fn is_unit_identifier(name: &str) -> bool {
    all_consuming(identifier).parse(Span::new(name)).is_ok()
}

fn ws<'a, O>(
    parser: impl nom::Parser<Span<'a>, Output = O, Error = nom::error::Error<Span<'a>>>,
) -> impl nom::Parser<Span<'a>, Output = O, Error = nom::error::Error<Span<'a>>> {
    delimited(multispace0, parser, multispace0)
}

fn unit_expr(input: Span<'_>) -> Result<'_, UnitExpr> {
    let (rest, first_term) = unit_term(input)?;

    let operator = alt((
        value(UnitOp::Divide, ws(char('/'))),
        value(UnitOp::Multiply, ws(terminated(char('*'), not(char('*'))))),
    ));

    let (rest, rest_terms) = many0((operator, unit_term)).parse(rest)?;

    let expr = rest_terms
        .into_iter()
        .fold(first_term, |left, (op, right)| match op {
            UnitOp::Multiply => UnitExpr::Multiply(Box::new(left), Box::new(right)),
            UnitOp::Divide => UnitExpr::Divide(Box::new(left), Box::new(right)),
        });

    Ok((rest, expr))
}

fn unit_term(input: Span<'_>) -> Result<'_, UnitExpr> {
    let (rest, atom) = unit_atom(input)?;

    let power = preceded(ws(alt((tag("**"), tag("^")))), exponent);
    let (rest, power) = opt(power).parse(rest)?;

    let term = match power {
        Some(exponent) => UnitExpr::Power {
            base: Box::new(atom),
            exponent,
        },
        None => atom,
    };

    Ok((rest, term))
}

fn unit_atom(input: Span<'_>) -> Result<'_, UnitExpr> {
    alt((
        map(identifier, |name: Span<'_>| {
            UnitExpr::Name((*name.fragment()).to_string())
        }),
        value(UnitExpr::One, terminated(char('1'), not(digit1))),
        delimited(ws(char('(')), unit_expr, ws(char(')'))),
    ))
    .parse(input)
}

fn identifier(input: Span<'_>) -> Result<'_, Span<'_>> {
    recognize((
        satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '%'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$'),
    ))
    .parse(input)
}

fn number(input: Span<'_>) -> Result<'_, f64> {
    let literal = recognize((
        opt(one_of("+-")),
        digit1,
        opt((char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ));

    map_res(literal, |literal: Span<'_>| literal.fragment().parse::<f64>()).parse(input)
}

fn exponent(input: Span<'_>) -> Result<'_, f64> {
    let fraction = map(
        (number, opt(preceded(ws(char('/')), number))),
        |(numerator, denominator)| denominator.map_or(numerator, |d| numerator / d),
    );

    alt((number, delimited(ws(char('(')), fraction, ws(char(')'))))).parse(input)
}
