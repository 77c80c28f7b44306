//! Symbolic function registry with unit-aware composition.
//!
//! This crate gathers the public API of the symreg crates:
//!
//! - [`unit`] resolves unit expressions and converts between compatible
//!   units
//! - [`expr`] parses, renders and evaluates symbolic expressions
//! - the registry types re-exported at the crate root declare, compose,
//!   present and simulate functions
//!
//! ```ignore
//! use symreg::Registry;
//!
//! let mut registry = Registry::new();
//! registry.declare("a(x[m])[km/s] = x")?;
//! registry.declare("b(y[cm])[m/s] = y")?;
//! registry.assign("c(x[m], y[m])[m/s]", "a + b")?;
//!
//! let c = registry.get("c").expect("registered");
//! assert_eq!(c.call(&[1.0.into(), 2.0.into()])?.as_scalar(), Some(1200.0));
//! ```

pub use symreg_expr as expr;
pub use symreg_unit as unit;

pub use symreg_expr::{Equation, Expr, Signature, Symbol, Value};
pub use symreg_registry::{
    AttrValue, Body, Callable, Config, DeclarationInput, Definition, Detail, DetailRow, Entry,
    Implementation, Key, Meta, NativeFunction, Param, ParsedDeclaration, Registry, RegistryError,
    Simulation, SimulationError, Solution, SolveOptions, Trajectory, WrapOptions, Wrappable,
    compose, gridify, parse, simulate, solve, strip_math_delimiters, wrap,
};
pub use symreg_unit::{Unit, UnitCatalog, UnitError};
