//! Stepping a state forward with update functions.

use indexmap::IndexMap;
use symreg_expr::Value;

use crate::{error::SimulationError, wrapper::Implementation};

/// A lazy sequence of state snapshots.
///
/// Each pull runs one step: every update function is called, in order,
/// with the state keys that match its parameter names, and its result
/// replaces the state key it updates. Later updates in the same step see
/// the results of earlier ones.
///
/// The sequence yields exactly one snapshot per step and ends early after
/// the first error.
#[derive(Debug)]
pub struct Simulation {
    updates: Vec<(String, Implementation)>,
    state: IndexMap<String, Value>,
    remaining: usize,
    failed: bool,
}

impl Simulation {
    /// Creates a simulation that runs `steps` steps from `initial`.
    #[must_use]
    pub const fn new(
        updates: Vec<(String, Implementation)>,
        initial: IndexMap<String, Value>,
        steps: usize,
    ) -> Self {
        Self {
            updates,
            state: initial,
            remaining: steps,
            failed: false,
        }
    }

    /// The state after the last completed step.
    #[must_use]
    pub const fn state(&self) -> &IndexMap<String, Value> {
        &self.state
    }

    fn step(&mut self) -> Result<(), SimulationError> {
        for (key, update) in &self.updates {
            let value = update
                .call_named(&self.state)
                .map_err(|source| SimulationError {
                    key: key.clone(),
                    source,
                })?;
            self.state.insert(key.clone(), value);
        }

        Ok(())
    }
}

impl Iterator for Simulation {
    type Item = Result<IndexMap<String, Value>, SimulationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match self.step() {
            Ok(()) => Some(Ok(self.state.clone())),
            Err(error) => {
                tracing::debug!(key = %error.key, error = %error.source, "simulation step failed");
                self.failed = true;
                Some(Err(error))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}

/// Runs `steps` steps of the given update functions from `initial`.
///
/// The updates are keyed by the state key they produce and run in the
/// order given.
pub fn simulate<K, S>(
    updates: impl IntoIterator<Item = (K, Implementation)>,
    initial: IndexMap<S, Value>,
    steps: usize,
) -> Simulation
where
    K: Into<String>,
    S: Into<String>,
{
    Simulation::new(
        updates
            .into_iter()
            .map(|(key, update)| (key.into(), update))
            .collect(),
        initial
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect(),
        steps,
    )
}

#[cfg(test)]
mod tests {
    use symreg_expr::EvalError;

    use super::*;
    use crate::wrapper::Callable;

    fn scalar(value: &Value) -> f64 {
        value.as_scalar().expect("state values are scalars")
    }

    fn state_functions() -> Vec<(&'static str, Implementation)> {
        let update_y: Implementation = Callable::new("update_y", |args| Ok(args[0].map(|x| x + 1.0)))
            .arg("x")
            .into();
        let update_x: Implementation = Callable::new("update_x", |args| Ok(args[0].map(|y| y - 2.0)))
            .arg("y")
            .into();
        let update_t: Implementation = Callable::new("update_t", |args| args[0].checked_add(&args[1]))
            .arg("t")
            .arg("dt")
            .into();

        vec![("y", update_y), ("x", update_x), ("t", update_t)]
    }

    fn initial() -> IndexMap<&'static str, Value> {
        IndexMap::from([("x", 3.0.into()), ("t", 0.0.into()), ("dt", 1.0.into())])
    }

    #[test]
    fn runs_every_step_in_order() {
        let snapshots = simulate(state_functions(), initial(), 10)
            .collect::<Result<Vec<_>, _>>()
            .expect("simulation succeeds");

        assert_eq!(snapshots.len(), 10);

        let last = snapshots.last().expect("ten snapshots");
        assert_eq!(scalar(&last["x"]), -7.0);
        assert_eq!(scalar(&last["y"]), -5.0);
        assert_eq!(scalar(&last["t"]), 10.0);

        let first = &snapshots[0];
        assert_eq!(scalar(&first["y"]), 4.0);
        assert_eq!(scalar(&first["x"]), 2.0);
    }

    #[test]
    fn stops_after_first_error() {
        let failing: Implementation =
            Callable::new("update_y", |_args: &[Value]| Err(EvalError::custom("unsupported operand")))
                .arg("x")
                .into();
        let mut updates = state_functions();
        updates[0].1 = failing;

        let mut simulation = simulate(updates, initial(), 10);
        let error = simulation
            .next()
            .expect("one item")
            .expect_err("first update fails");

        assert_eq!(error.key, "y");
        assert!(error.to_string().starts_with("y: "));
        assert!(simulation.next().is_none());
    }

    #[test]
    fn zero_steps_is_empty() {
        let mut simulation = simulate(state_functions(), initial(), 0);

        assert!(simulation.next().is_none());
        assert_eq!(scalar(&simulation.state()["x"]), 3.0);
    }
}
