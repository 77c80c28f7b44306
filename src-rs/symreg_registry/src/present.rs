//! LaTeX and tabular views of a registry.

use std::fmt;

use indexmap::IndexMap;
use symreg_expr::{Symbol, lambda_to_latex, signature_to_latex, to_latex};

use crate::{registry::Entry, util::strip_math_delimiters};

/// The left- and right-hand side of an entry's display equation.
///
/// The right-hand side is the retained symbolic definition, else the
/// attached equation, else a `\lambda` placeholder over the arguments.
fn equation_sides(entry: &Entry) -> (String, String) {
    let lhs = signature_to_latex(entry.signature());
    let rhs = entry.expr().map_or_else(
        || {
            entry.implementation().meta().equation.map_or_else(
                || lambda_to_latex(entry.signature().args()),
                |equation| strip_math_delimiters(&equation).to_string(),
            )
        },
        to_latex,
    );

    (lhs, rhs)
}

/// Renders one `equation` environment per entry, separated by newlines.
///
/// A non-empty result unit is written in brackets after the signature, so
/// every equation of a purely symbolic entry parses back as a declaration
/// with the same signature and unit.
pub fn render_all_latex<'a>(entries: impl Iterator<Item = &'a Entry>) -> String {
    entries
        .map(|entry| {
            let (lhs, rhs) = equation_sides(entry);
            let units = entry.implementation().units();
            if units.is_empty() {
                format!("\\begin{{equation}}{lhs} = {rhs}\\end{{equation}}")
            } else {
                format!("\\begin{{equation}}{lhs}[{units}] = {rhs}\\end{{equation}}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One row of [`Detail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    /// The signature, such as `f(x)`
    pub symbol: String,
    /// The result unit, empty when unitless
    pub units: String,
    /// The argument units
    pub arg_units: IndexMap<Symbol, String>,
    /// The display equation in LaTeX
    pub equation: String,
    /// The name of the function that implements the entry
    pub lambda: String,
}

/// A table describing every entry of a registry, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detail {
    /// The rows
    pub rows: Vec<DetailRow>,
}

/// Builds a [`Detail`] table.
pub fn detail<'a>(entries: impl Iterator<Item = &'a Entry>) -> Detail {
    let rows = entries
        .map(|entry| {
            let (lhs, rhs) = equation_sides(entry);
            DetailRow {
                symbol: entry.signature().to_string(),
                units: entry.implementation().units(),
                arg_units: entry.implementation().arg_units(),
                equation: format!("{lhs} = {rhs}"),
                lambda: entry.implementation().name().to_string(),
            }
        })
        .collect();

    Detail { rows }
}

fn format_arg_units(arg_units: &IndexMap<Symbol, String>) -> String {
    arg_units
        .iter()
        .map(|(arg, unit)| format!("{arg}: {unit}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HEADERS: [&str; 5] = ["symbol", "units", "arg_units", "equation", "lambda"];

        let cells = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.symbol.clone(),
                    row.units.clone(),
                    format_arg_units(&row.arg_units),
                    row.equation.clone(),
                    row.lambda.clone(),
                ]
            })
            .collect::<Vec<_>>();

        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let write_row = |f: &mut fmt::Formatter<'_>, row: &[&str]| -> fmt::Result {
            let line = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())
        };

        write_row(f, &HEADERS)?;
        let rule = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-");
        writeln!(f, "{rule}")?;
        for row in &cells {
            write_row(f, &row.each_ref().map(String::as_str))?;
        }

        Ok(())
    }
}
