//! Function registry and composition engine for symreg.
//!
//! A [`Registry`] maps function names to [`Implementation`]s. Functions are
//! declared in a small grammar,
//!
//! ```text
//! name(arg1[unit1], arg2[unit2])[unit] = expression
//! ```
//!
//! or registered from native closures. A symbolic declaration may call any
//! function registered before it, either explicitly (`g(x) = f(x) + x**2`)
//! or by bare name (`h = g**2`), and the registry checks and converts units
//! across those calls so that every implementation returns values in its
//! declared unit.
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.declare("f(x) = x**2")?;
//! registry.declare("g(x) = f(x) + x**2")?;
//! let g = registry.get("g").expect("registered");
//! assert_eq!(g.call(&[3.0.into()])?.as_scalar(), Some(18.0));
//! ```

mod compose;
mod config;
mod error;
mod present;
mod registry;
mod signature;
mod simulate;
mod solve;
mod util;
mod wrapper;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{RegistryError, SimulationError};
pub use present::{Detail, DetailRow};
pub use registry::{Entry, Registry, compose};
pub use signature::{Body, DeclarationInput, Definition, Key, ParsedDeclaration, parse};
pub use simulate::{Simulation, simulate};
pub use solve::{Solution, SolveOptions, Trajectory, solve};
pub use util::strip_math_delimiters;
pub use wrapper::{
    AttrValue, Callable, Implementation, Meta, NativeFunction, Param, WrapOptions, Wrappable,
    gridify, wrap,
};
