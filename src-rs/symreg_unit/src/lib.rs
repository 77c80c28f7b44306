//! Canonical physical units for symreg.
//!
//! A [`Unit`] is a dimension map plus a magnitude relative to the SI base
//! units. Units are obtained from unit expressions such as `kg/m^3` through
//! a [`UnitCatalog`], which holds the builtin unit and prefix tables and any
//! custom units defined at runtime.

mod builtin;
mod catalog;
mod dimension;
mod error;
mod parser;
mod unit;
mod util;

pub use builtin::{builtin_abbreviations, builtin_prefixes, builtin_prefixes_docs, builtin_units};
pub use catalog::UnitCatalog;
pub use dimension::{Dimension, DimensionMap};
pub use error::UnitError;
pub use parser::{UnitExpr, is_unit_identifier, parse_unit_expr};
pub use unit::{DisplayUnit, Unit};
pub use util::is_close;
