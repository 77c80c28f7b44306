//! Integration of scalar ordinary differential equations.
//!
//! The derivative is a registered function of the independent variable and
//! one state variable. Integration uses fixed-step classical Runge-Kutta and
//! stops early where an event function changes sign; the crossing is
//! refined by bisection.

use symreg_expr::{EvalError, Value};

use crate::wrapper::{AttrValue, Callable, Implementation, WrapOptions, wrap};

const BISECTION_STEPS: usize = 60;

/// Options for [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOptions {
    /// The number of integration steps across the whole range
    pub steps: usize,
}

impl SolveOptions {
    /// Creates options with 1000 steps.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: 1000 }
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the integration from one seed ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// The initial state
    pub seed: f64,
    /// The value of the independent variable where integration stopped
    pub end: f64,
    /// The state at `end`
    pub state: f64,
    /// The index of the event that stopped integration, if any
    pub event: Option<usize>,
}

/// One trajectory endpoint per seed, in seed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// The trajectory endpoints
    pub trajectories: Vec<Trajectory>,
}

impl Solution {
    /// Turns the endpoints into a nullary implementation returning the
    /// flattened `[end, state]` rows. The `shape` attribute records the
    /// row layout.
    #[must_use]
    pub fn into_implementation(self, name: impl Into<String>) -> Implementation {
        let rows = self
            .trajectories
            .iter()
            .flat_map(|trajectory| [trajectory.end, trajectory.state])
            .collect::<Vec<_>>();
        let shape = AttrValue::Shape(vec![self.trajectories.len(), 2]);

        let data = Value::from(rows);
        let returned = data.clone();
        let callable = Callable::new(name, move |_args: &[Value]| Ok(returned.clone()));

        wrap(callable, WrapOptions::new().data(data).attr("shape", shape))
    }
}

/// The derivative or an event function, called as `f(t, y)`.
struct StateFunction<'a> {
    implementation: &'a Implementation,
    independent: usize,
}

impl<'a> StateFunction<'a> {
    fn new(implementation: &'a Implementation, independent: &str) -> Result<Self, EvalError> {
        let params = implementation.params();
        if params.len() != 2 {
            return Err(EvalError::ArgumentCount {
                name: implementation.name().to_string(),
                expected: 2,
                found: params.len(),
            });
        }

        let independent = params
            .iter()
            .position(|param| param.name.name() == independent)
            .ok_or_else(|| EvalError::MissingArgument {
                name: implementation.name().to_string(),
                param: independent.to_string(),
            })?;

        Ok(Self {
            implementation,
            independent,
        })
    }

    fn eval(&self, t: f64, y: f64) -> Result<f64, EvalError> {
        let args = if self.independent == 0 {
            [Value::Scalar(t), Value::Scalar(y)]
        } else {
            [Value::Scalar(y), Value::Scalar(t)]
        };

        self.implementation
            .call(&args)?
            .as_scalar()
            .ok_or_else(|| EvalError::ExpectedScalar {
                name: self.implementation.name().to_string(),
            })
    }
}

/// Integrates `derivative` over `range` from every seed.
///
/// `derivative` and each of `events` take the independent variable, named
/// `independent`, and one state variable.
///
/// # Errors
///
/// Returns an error if a function does not take exactly those two
/// arguments, fails, or returns an array.
pub fn solve(
    derivative: &Implementation,
    seeds: &[f64],
    independent: &str,
    range: (f64, f64),
    events: &[Implementation],
    options: SolveOptions,
) -> Result<Solution, EvalError> {
    let derivative = StateFunction::new(derivative, independent)?;
    let events = events
        .iter()
        .map(|event| StateFunction::new(event, independent))
        .collect::<Result<Vec<_>, _>>()?;

    let trajectories = seeds
        .iter()
        .map(|seed| integrate(&derivative, *seed, range, &events, options.steps.max(1)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Solution { trajectories })
}

fn integrate(
    derivative: &StateFunction<'_>,
    seed: f64,
    (start, stop): (f64, f64),
    events: &[StateFunction<'_>],
    steps: usize,
) -> Result<Trajectory, EvalError> {
    #[expect(
        clippy::cast_precision_loss,
        reason = "step counts are far below the precision limit"
    )]
    let step = (stop - start) / steps as f64;

    let mut t = start;
    let mut y = seed;
    let mut previous = events
        .iter()
        .map(|event| event.eval(t, y))
        .collect::<Result<Vec<_>, _>>()?;

    for index in 1..=steps {
        #[expect(
            clippy::cast_precision_loss,
            reason = "step counts are far below the precision limit"
        )]
        let t_next = start + step * index as f64;
        let y_next = runge_kutta(derivative, t, y, t_next - t)?;

        if !y_next.is_finite() {
            tracing::debug!(seed, t, "integration diverged");
            break;
        }

        for (event_index, (event, before)) in events.iter().zip(&previous).enumerate() {
            let after = event.eval(t_next, y_next)?;
            if crosses(*before, after) {
                let (end, state) = bisect(derivative, event, (t, y), t_next)?;
                return Ok(Trajectory {
                    seed,
                    end,
                    state,
                    event: Some(event_index),
                });
            }
        }

        previous = events
            .iter()
            .map(|event| event.eval(t_next, y_next))
            .collect::<Result<Vec<_>, _>>()?;
        t = t_next;
        y = y_next;
    }

    Ok(Trajectory {
        seed,
        end: t,
        state: y,
        event: None,
    })
}

fn runge_kutta(derivative: &StateFunction<'_>, t: f64, y: f64, h: f64) -> Result<f64, EvalError> {
    let k1 = derivative.eval(t, y)?;
    let k2 = derivative.eval(h.mul_add(0.5, t), (h * 0.5).mul_add(k1, y))?;
    let k3 = derivative.eval(h.mul_add(0.5, t), (h * 0.5).mul_add(k2, y))?;
    let k4 = derivative.eval(t + h, h.mul_add(k3, y))?;

    Ok((h / 6.0).mul_add(2.0f64.mul_add(k3, 2.0f64.mul_add(k2, k1)) + k4, y))
}

fn crosses(before: f64, after: f64) -> bool {
    before != 0.0 && (after == 0.0 || before.signum() != after.signum())
}

/// Narrows a sign change of `event` between `t` and `t_high` down to a
/// point, integrating from `t` with a single step each time.
fn bisect(
    derivative: &StateFunction<'_>,
    event: &StateFunction<'_>,
    (t, y): (f64, f64),
    t_high: f64,
) -> Result<(f64, f64), EvalError> {
    let at_start = event.eval(t, y)?;
    let mut low = t;
    let mut high = t_high;

    for _ in 0..BISECTION_STEPS {
        let middle = 0.5 * (low + high);
        let state = runge_kutta(derivative, t, y, middle - t)?;
        if crosses(at_start, event.eval(middle, state)?) {
            high = middle;
        } else {
            low = middle;
        }
    }

    Ok((high, runge_kutta(derivative, t, y, high - t)?))
}
