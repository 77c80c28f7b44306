//! LaTeX rendering of expressions and signatures.
//!
//! The output uses the LaTeX dialect accepted by the parser, so rendered
//! expressions parse back to the same expression.

use crate::{
    builtin,
    expr::{BinaryOp, Expr},
    symbol::{Signature, Symbol},
};

const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "nu", "xi", "pi", "rho", "sigma", "tau", "upsilon", "phi", "chi", "psi",
    "omega", "Gamma", "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi", "Psi",
    "Omega",
];

/// Renders a name, prefixing Greek letters with a backslash and turning
/// the first underscore into a subscript: `rho_E` becomes `\rho_{E}`.
#[must_use]
pub fn name_to_latex(name: &str) -> String {
    let (base, subscript) = match name.split_once('_') {
        Some((base, subscript)) if !base.is_empty() && !subscript.is_empty() => {
            (base, Some(subscript))
        }
        _ => (name, None),
    };

    let mut latex = if GREEK_LETTERS.contains(&base) {
        format!("\\{base}")
    } else {
        base.to_string()
    };

    if let Some(subscript) = subscript {
        latex.push_str(&format!("_{{{subscript}}}"));
    }

    latex
}

fn args_to_latex(args: impl Iterator<Item = String>) -> String {
    format!("{{\\left({} \\right)}}", args.collect::<Vec<_>>().join(","))
}

/// Renders a function signature, such as `f{\left(x,y \right)}`.
///
/// A signature without arguments renders as its name.
#[must_use]
pub fn signature_to_latex(signature: &Signature) -> String {
    let name = name_to_latex(signature.name());
    if signature.args().is_empty() {
        return name;
    }

    let args = signature
        .args()
        .iter()
        .map(|arg| name_to_latex(arg.name()));
    format!("{name}{}", args_to_latex(args))
}

/// Renders a placeholder body for a function with no symbolic source:
/// `\lambda{\left(x,y \right)}`.
#[must_use]
pub fn lambda_to_latex(args: &[Symbol]) -> String {
    let args = args.iter().map(|arg| name_to_latex(arg.name()));
    format!("\\lambda{}", args_to_latex(args))
}

const SUM_PRECEDENCE: u8 = 1;
const PRODUCT_PRECEDENCE: u8 = 2;
const NEG_PRECEDENCE: u8 = 3;
const POWER_PRECEDENCE: u8 = 4;
const ATOM_PRECEDENCE: u8 = 5;

const fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Number(value) if value.is_sign_negative() => NEG_PRECEDENCE,
        Expr::Number(_) | Expr::Symbol(_) | Expr::Call { .. } => ATOM_PRECEDENCE,
        Expr::Binary { op, .. } => match op {
            BinaryOp::Add | BinaryOp::Sub => SUM_PRECEDENCE,
            // a fraction is a self-contained group
            BinaryOp::Div => ATOM_PRECEDENCE,
            BinaryOp::Mul => PRODUCT_PRECEDENCE,
            BinaryOp::Pow => POWER_PRECEDENCE,
        },
        Expr::Neg(_) => NEG_PRECEDENCE,
    }
}

fn grouped(expr: &Expr, parenthesize: bool) -> String {
    if parenthesize {
        format!("\\left({}\\right)", to_latex(expr))
    } else {
        to_latex(expr)
    }
}

fn number_to_latex(value: f64) -> String {
    format!("{value}")
}

/// Renders an expression as LaTeX.
///
/// Products are written with `\cdot`, quotients with `\frac`, and applied
/// functions with `\left(`/`\right)` argument lists.
#[must_use]
pub fn to_latex(expr: &Expr) -> String {
    match expr {
        Expr::Number(value) => number_to_latex(*value),
        Expr::Symbol(symbol) => name_to_latex(symbol.name()),
        Expr::Call { name, args } => {
            if name == "sqrt" && args.len() == 1 {
                return args
                    .first()
                    .map(|arg| format!("\\sqrt{{{}}}", to_latex(arg)))
                    .unwrap_or_default();
            }

            let rendered_name = if builtin::is_function(name) {
                format!("\\{name}")
            } else {
                name_to_latex(name)
            };
            format!("{rendered_name}{}", args_to_latex(args.iter().map(to_latex)))
        }
        Expr::Binary { op, left, right } => match op {
            BinaryOp::Add => format!("{} + {}", to_latex(left), to_latex(right)),
            BinaryOp::Sub => format!(
                "{} - {}",
                to_latex(left),
                grouped(right, precedence(right) <= SUM_PRECEDENCE)
            ),
            BinaryOp::Mul => format!(
                "{} \\cdot {}",
                grouped(left, precedence(left) < PRODUCT_PRECEDENCE),
                grouped(right, precedence(right) <= NEG_PRECEDENCE)
            ),
            BinaryOp::Div => format!("\\frac{{{}}}{{{}}}", to_latex(left), to_latex(right)),
            BinaryOp::Pow => format!(
                "{}^{{{}}}",
                grouped(left, precedence(left) <= POWER_PRECEDENCE),
                to_latex(right)
            ),
        },
        Expr::Neg(expr) => format!("- {}", grouped(expr, precedence(expr) < NEG_PRECEDENCE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expression;

    fn latex(text: &str) -> String {
        to_latex(&parse_expression(text, None).expect("should parse expression"))
    }

    #[test]
    fn powers_and_products() {
        assert_eq!(latex("x**2"), "x^{2}");
        assert_eq!(latex("(x + 1)**2"), "\\left(x + 1\\right)^{2}");
        assert_eq!(latex("2*x*y"), "2 \\cdot x \\cdot y");
        assert_eq!(latex("a/b"), "\\frac{a}{b}");
        assert_eq!(latex("0.5*x"), "0.5 \\cdot x");
    }

    #[test]
    fn functions() {
        assert_eq!(latex("f(x)"), "f{\\left(x \\right)}");
        assert_eq!(latex("g(x, y, z)"), "g{\\left(x,y,z \\right)}");
        assert_eq!(latex("sin(x)"), "\\sin{\\left(x \\right)}");
        assert_eq!(latex("sqrt(x)"), "\\sqrt{x}");
    }

    #[test]
    fn names() {
        assert_eq!(name_to_latex("rho"), "\\rho");
        assert_eq!(name_to_latex("f_m1"), "f_{m1}");
        assert_eq!(name_to_latex("rho_E"), "\\rho_{E}");
        assert_eq!(latex("pi*r**2"), "\\pi \\cdot r^{2}");
    }

    #[test]
    fn signatures() {
        let signature = Signature::new("g", vec![Symbol::new("x"), Symbol::new("y")]);
        assert_eq!(signature_to_latex(&signature), "g{\\left(x,y \\right)}");
        assert_eq!(signature_to_latex(&Signature::nullary("c")), "c");
        assert_eq!(
            lambda_to_latex(signature.args()),
            "\\lambda{\\left(x,y \\right)}"
        );
    }

    #[test]
    fn rendered_output_parses_back() {
        for text in ["x**2 + f(x)", "-(a - b)/c", "a - (b + c)", "rho_E*2**-1", "sin(x)**2"] {
            let expr = parse_expression(text, None).expect("should parse expression");
            let reparsed = parse_expression(&to_latex(&expr), None).expect("should reparse");
            assert_eq!(reparsed, expr, "round trip of {text}");
        }
    }
}
