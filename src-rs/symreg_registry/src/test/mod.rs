//! Scenario tests for the registry.
//!
//! The tests in the submodules drive a [`Registry`] the way a user would:
//! declare functions, compose them, and call the results. The helpers here
//! keep those scenarios short.

mod access;
mod units;

use symreg_expr::Value;
use symreg_unit::is_close;

use crate::{Registry, RegistryError};

/// Builds a registry from declarations that are expected to succeed.
fn registry(declarations: &[&str]) -> Registry {
    Registry::from_declarations(declarations.iter().copied())
        .expect("declarations should register")
}

/// Calls a registered function with scalar arguments.
fn call(registry: &Registry, name: &str, args: &[f64]) -> Result<f64, RegistryError> {
    let implementation = registry
        .get(name)
        .ok_or_else(|| RegistryError::AttributeNotFound {
            name: name.to_string(),
        })?;
    let args = args.iter().copied().map(Value::from).collect::<Vec<_>>();
    let value = implementation.call(&args)?;

    Ok(value.as_scalar().expect("result should be a scalar"))
}

#[track_caller]
fn assert_close(actual: f64, expected: f64) {
    assert!(
        is_close(actual, expected),
        "expected {expected}, got {actual}"
    );
}
