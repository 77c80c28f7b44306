//! Expression parsing for the plain and LaTeX dialects.
//!
//! Precedence, from loosest to tightest:
//!
//! ```text
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/' | '\cdot' | '\times') unary)*
//! unary          := '-' unary | '+' unary | power
//! power          := primary (('**' | '^') unary)?
//! primary        := number | '\frac' group group | '\sqrt' group
//!                 | '(' additive ')' | '\left(' additive '\right)' | group
//!                 | name call_args?
//! ```
//!
//! Constructs that start with a backslash, and brace groups, are only
//! accepted when [`Config::latex`] is set.

use nom::{
    IResult, Parser as NomParser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, preceded, terminated},
};
use nom_locate::LocatedSpan;

use crate::{
    config::Config,
    error::{ParserError, ParserErrorReason},
    expr::{BinaryOp, Expr},
};

/// A span of text in the input string, carrying the parser configuration.
pub type Span<'a> = LocatedSpan<&'a str, Config>;

/// A result type for parser operations.
pub type Result<'a, O> = IResult<Span<'a>, O, ParserError>;

/// A parser over [`Span`]s that fails with [`ParserError`].
pub trait Parser<'a, O>: NomParser<Span<'a>, Output = O, Error = ParserError> {}

impl<'a, O, P> Parser<'a, O> for P where P: NomParser<Span<'a>, Output = O, Error = ParserError> {}

/// LaTeX commands that are never names.
const LATEX_COMMANDS: &[&str] = &[
    "left", "right", "frac", "sqrt", "cdot", "times", "begin", "end",
];

/// Wraps a parser so that it consumes trailing whitespace.
pub fn token<'a, O>(parser: impl Parser<'a, O>) -> impl Parser<'a, O> {
    terminated(parser, multispace0)
}

/// Parses the given literal text followed by optional whitespace.
pub fn symbol<'a>(text: &'static str) -> impl Parser<'a, Span<'a>> {
    token(tag(text))
}

/// Runs `parser` only when the LaTeX dialect is enabled.
pub fn latex_only<'a, O>(mut parser: impl Parser<'a, O>) -> impl Parser<'a, O> {
    move |input: Span<'a>| {
        if input.extra.latex {
            parser.parse(input)
        } else {
            Err(nom::Err::Error(ParserError::new(
                ParserErrorReason::Nom(nom::error::ErrorKind::Verify),
                input.location_offset(),
            )))
        }
    }
}

/// Commits to `parser`: a recoverable error becomes a failure with `reason`.
///
/// Failures raised deeper inside `parser` keep their own reason.
pub fn expect<'a, O>(
    mut parser: impl Parser<'a, O>,
    reason: ParserErrorReason,
) -> impl Parser<'a, O> {
    move |input: Span<'a>| match parser.parse(input) {
        Err(nom::Err::Error(error)) => Err(nom::Err::Failure(error.with_reason(reason))),
        result => result,
    }
}

fn left_associative_binary_op<'a>(
    mut operand: impl Parser<'a, Expr> + Copy,
    mut operator: impl Parser<'a, BinaryOp>,
) -> impl Parser<'a, Expr> {
    move |input| {
        let (rest, first_operand) = operand.parse(input)?;
        let (rest, rest_operands) = many0(|input| {
            let (rest, operator) = operator.parse(input)?;
            let (rest, operand) = expect(operand, ParserErrorReason::MissingOperand).parse(rest)?;
            Ok((rest, (operator, operand)))
        })
        .parse(rest)?;

        let expr = rest_operands
            .into_iter()
            .fold(first_operand, |acc, (op, expr)| Expr::binary(op, acc, expr));

        Ok((rest, expr))
    }
}

/// Parses an expression.
///
/// This function **may not consume the complete input**.
pub fn expr(input: Span<'_>) -> Result<'_, Expr> {
    additive_expr(input)
}

fn additive_expr(input: Span<'_>) -> Result<'_, Expr> {
    let op = alt((
        value(BinaryOp::Add, symbol("+")),
        value(BinaryOp::Sub, symbol("-")),
    ));

    left_associative_binary_op(multiplicative_expr, op).parse(input)
}

fn multiplicative_expr(input: Span<'_>) -> Result<'_, Expr> {
    let op = alt((
        value(BinaryOp::Mul, token(terminated(tag("*"), not(char('*'))))),
        value(BinaryOp::Div, symbol("/")),
        value(BinaryOp::Mul, latex_only(symbol("\\cdot"))),
        value(BinaryOp::Mul, latex_only(symbol("\\times"))),
    ));

    left_associative_binary_op(unary_expr, op).parse(input)
}

fn unary_expr(input: Span<'_>) -> Result<'_, Expr> {
    alt((
        map(
            preceded(
                symbol("-"),
                expect(unary_expr, ParserErrorReason::MissingOperand),
            ),
            Expr::neg,
        ),
        preceded(
            symbol("+"),
            expect(unary_expr, ParserErrorReason::MissingOperand),
        ),
        power_expr,
    ))
    .parse(input)
}

fn power_expr(input: Span<'_>) -> Result<'_, Expr> {
    let (rest, base) = primary_expr(input)?;
    let (rest, exponent) = opt(preceded(
        alt((symbol("**"), symbol("^"))),
        expect(unary_expr, ParserErrorReason::MissingOperand),
    ))
    .parse(rest)?;

    let expr = match exponent {
        Some(exponent) => Expr::binary(BinaryOp::Pow, base, exponent),
        None => base,
    };

    Ok((rest, expr))
}

fn primary_expr(input: Span<'_>) -> Result<'_, Expr> {
    alt((
        number,
        latex_only(fraction),
        latex_only(square_root),
        parenthesized,
        latex_only(left_right_group),
        latex_only(brace_group),
        call_or_symbol,
    ))
    .parse(input)
}

fn number(input: Span<'_>) -> Result<'_, Expr> {
    let literal = recognize((
        digit1,
        opt((char('.'), take_while(|c: char| c.is_ascii_digit()))),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ));

    token(map_res(literal, |literal: Span<'_>| {
        literal.fragment().parse::<f64>().map(Expr::Number)
    }))
    .parse(input)
}

fn parenthesized(input: Span<'_>) -> Result<'_, Expr> {
    delimited(
        symbol("("),
        expect(expr, ParserErrorReason::ExpectedExpression),
        expect(symbol(")"), ParserErrorReason::UnclosedParen),
    )
    .parse(input)
}

fn left_right_group(input: Span<'_>) -> Result<'_, Expr> {
    delimited(
        symbol("\\left("),
        expect(expr, ParserErrorReason::ExpectedExpression),
        expect(symbol("\\right)"), ParserErrorReason::UnclosedParen),
    )
    .parse(input)
}

fn brace_group(input: Span<'_>) -> Result<'_, Expr> {
    delimited(
        symbol("{"),
        expect(expr, ParserErrorReason::ExpectedExpression),
        expect(symbol("}"), ParserErrorReason::UnclosedParen),
    )
    .parse(input)
}

fn fraction(input: Span<'_>) -> Result<'_, Expr> {
    let (rest, _) = symbol("\\frac").parse(input)?;
    let (rest, numerator) = expect(brace_group, ParserErrorReason::ExpectedExpression).parse(rest)?;
    let (rest, denominator) =
        expect(brace_group, ParserErrorReason::ExpectedExpression).parse(rest)?;

    Ok((rest, Expr::binary(BinaryOp::Div, numerator, denominator)))
}

fn square_root(input: Span<'_>) -> Result<'_, Expr> {
    let (rest, _) = symbol("\\sqrt").parse(input)?;
    let (rest, radicand) = expect(brace_group, ParserErrorReason::ExpectedExpression).parse(rest)?;

    Ok((rest, Expr::call("sqrt", vec![radicand])))
}

fn call_or_symbol(input: Span<'_>) -> Result<'_, Expr> {
    let (rest, name) = name(input)?;
    let (rest, args) = opt(call_args).parse(rest)?;

    let expr = match args {
        Some(args) => Expr::call(name, args),
        None => Expr::symbol(name),
    };

    Ok((rest, expr))
}

fn argument_list(input: Span<'_>) -> Result<'_, Vec<Expr>> {
    separated_list0(symbol(","), expr).parse(input)
}

/// Parses the argument list of an applied function: `(a, b)`,
/// `\left(a, b \right)` or `{\left(a, b \right)}`.
fn call_args(input: Span<'_>) -> Result<'_, Vec<Expr>> {
    delimited_args(argument_list).parse(input)
}

/// Parses `open inner close` for every argument-list bracket style.
pub fn delimited_args<'a, O>(inner: impl Parser<'a, O> + Copy) -> impl Parser<'a, O> {
    alt((
        delimited(
            symbol("("),
            inner,
            expect(symbol(")"), ParserErrorReason::UnclosedParen),
        ),
        latex_only(delimited(
            (symbol("{"), symbol("\\left(")),
            inner,
            expect(
                (symbol("\\right)"), symbol("}")),
                ParserErrorReason::UnclosedParen,
            ),
        )),
        latex_only(delimited(
            symbol("\\left("),
            inner,
            expect(symbol("\\right)"), ParserErrorReason::UnclosedParen),
        )),
    ))
}

fn identifier(input: Span<'_>) -> Result<'_, Span<'_>> {
    recognize((
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric()),
    ))
    .parse(input)
}

fn subscript(input: Span<'_>) -> Result<'_, String> {
    let plain = map(
        take_while1(|c: char| c.is_ascii_alphanumeric()),
        |text: Span<'_>| (*text.fragment()).to_string(),
    );
    let braced = latex_only(delimited(
        char('{'),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |text: Span<'_>| (*text.fragment()).to_string(),
        ),
        char('}'),
    ));

    preceded(char('_'), alt((braced, plain))).parse(input)
}

/// Parses a name such as `x`, `rho_E`, `f_{m1}` or, in the LaTeX dialect,
/// `\rho`. The backslash is not part of the returned name.
pub fn name(input: Span<'_>) -> Result<'_, String> {
    let (rest, backslash) = opt(latex_only(char('\\'))).parse(input)?;
    let (rest, base) = identifier(rest)?;

    if backslash.is_some() && LATEX_COMMANDS.contains(base.fragment()) {
        return Err(nom::Err::Error(ParserError::new(
            ParserErrorReason::ExpectedExpression,
            input.location_offset(),
        )));
    }

    let (rest, subscripts) = many0(subscript).parse(rest)?;
    let (rest, _) = multispace0::<_, ParserError>(rest)?;

    let mut name = (*base.fragment()).to_string();
    for subscript in subscripts {
        name.push('_');
        name.push_str(&subscript);
    }

    Ok((rest, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expression;

    fn parsed(text: &str) -> Expr {
        parse_expression(text, None).expect("should parse expression")
    }

    fn plain(text: &str) -> std::result::Result<Expr, ParserError> {
        parse_expression(text, Some(Config::plain()))
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(parsed("1 + 2 * 3").to_string(), "1 + 2*3");
        assert_eq!(parsed("(1 + 2) * 3").to_string(), "(1 + 2)*3");
        assert_eq!(parsed("a - b - c").to_string(), "a - b - c");
        assert_eq!(parsed("a / b / c").to_string(), "a/b/c");
        assert_eq!(
            parsed("2^3^2"),
            Expr::binary(
                BinaryOp::Pow,
                Expr::Number(2.0),
                Expr::binary(BinaryOp::Pow, Expr::Number(3.0), Expr::Number(2.0))
            )
        );
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        assert_eq!(
            parsed("-x**2"),
            Expr::neg(Expr::binary(
                BinaryOp::Pow,
                Expr::symbol("x"),
                Expr::Number(2.0)
            ))
        );
        assert_eq!(
            parsed("x**-1"),
            Expr::binary(
                BinaryOp::Pow,
                Expr::symbol("x"),
                Expr::neg(Expr::Number(1.0))
            )
        );
    }

    #[test]
    fn both_power_operators() {
        assert_eq!(parsed("x**2"), parsed("x^2"));
    }

    #[test]
    fn calls_and_symbols() {
        assert_eq!(
            parsed("f(x, 2) + y"),
            Expr::binary(
                BinaryOp::Add,
                Expr::call("f", vec![Expr::symbol("x"), Expr::Number(2.0)]),
                Expr::symbol("y")
            )
        );
        assert_eq!(parsed("f_m1"), Expr::symbol("f_m1"));
    }

    #[test]
    fn latex_dialect() {
        assert_eq!(parsed("\\frac{a}{b}"), parsed("a / b"));
        assert_eq!(parsed("x^{2} \\cdot y"), parsed("x**2*y"));
        assert_eq!(parsed("\\sqrt{x}"), parsed("sqrt(x)"));
        assert_eq!(parsed("\\sin{\\left(x \\right)}"), parsed("sin(x)"));
        assert_eq!(
            parsed("f{\\left(x,y \\right)}"),
            parsed("f(x, y)")
        );
        assert_eq!(parsed("\\left(a + b\\right)^{2}"), parsed("(a + b)**2"));
        assert_eq!(parsed("\\rho_{E}"), Expr::symbol("rho_E"));
    }

    #[test]
    fn plain_dialect_rejects_latex() {
        assert!(plain("\\frac{a}{b}").is_err());
        assert!(plain("{x}").is_err());
        assert!(plain("x + y").is_ok());
    }

    #[test]
    fn errors() {
        let error = parse_expression("(x + 1", None).expect_err("unclosed");
        assert_eq!(error.reason, ParserErrorReason::UnclosedParen);

        let error = parse_expression("x +", None).expect_err("missing operand");
        assert_eq!(error.reason, ParserErrorReason::MissingOperand);

        let error = parse_expression("x y", None).expect_err("implicit multiplication");
        assert_eq!(error.reason, ParserErrorReason::UnexpectedToken);
        assert_eq!(error.offset, 2);
    }
}
