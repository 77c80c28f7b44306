use std::fmt;

use crate::error::EvalError;

/// A numeric value: a scalar or a one-dimensional array.
///
/// Arithmetic between a scalar and an array broadcasts the scalar over
/// every element. Arithmetic between two arrays is element-wise and
/// requires equal lengths.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single number
    Scalar(f64),
    /// A one-dimensional array of numbers
    Array(Vec<f64>),
}

impl Value {
    /// Returns the scalar, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Array(_) => None,
        }
    }

    /// Returns the array elements, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(values) => Some(values),
        }
    }

    /// The number of elements, `1` for a scalar.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Array(values) => values.len(),
        }
    }

    /// Checks whether this is an empty array.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Array(values) => values.is_empty(),
        }
    }

    /// Returns the element at `index`; a scalar yields itself for every index.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Array(values) => values.get(index).copied(),
        }
    }

    /// Returns the elements as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Scalar(value) => vec![*value],
            Self::Array(values) => values.clone(),
        }
    }

    /// Applies `f` to every element.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Self::Scalar(value) => Self::Scalar(f(*value)),
            Self::Array(values) => Self::Array(values.iter().copied().map(f).collect()),
        }
    }

    /// Combines two values element-wise, broadcasting scalars.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ShapeMismatch`] if both values are arrays of
    /// different lengths.
    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Result<Self, EvalError> {
        match (self, other) {
            (Self::Scalar(left), Self::Scalar(right)) => Ok(Self::Scalar(f(*left, *right))),
            (Self::Scalar(left), Self::Array(right)) => {
                Ok(Self::Array(right.iter().map(|right| f(*left, *right)).collect()))
            }
            (Self::Array(left), Self::Scalar(right)) => {
                Ok(Self::Array(left.iter().map(|left| f(*left, *right)).collect()))
            }
            (Self::Array(left), Self::Array(right)) => {
                if left.len() != right.len() {
                    return Err(EvalError::ShapeMismatch {
                        left: left.len(),
                        right: right.len(),
                    });
                }

                Ok(Self::Array(
                    left.iter()
                        .zip(right)
                        .map(|(left, right)| f(*left, *right))
                        .collect(),
                ))
            }
        }
    }

    /// Adds two values.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcast.
    pub fn checked_add(&self, other: &Self) -> Result<Self, EvalError> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Subtracts `other` from this value.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcast.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, EvalError> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Multiplies two values.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcast.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, EvalError> {
        self.zip_with(other, |a, b| a * b)
    }

    /// Divides this value by `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcast.
    pub fn checked_div(&self, other: &Self) -> Result<Self, EvalError> {
        self.zip_with(other, |a, b| a / b)
    }

    /// Raises this value to the power of `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcast.
    pub fn checked_pow(&self, other: &Self) -> Result<Self, EvalError> {
        self.zip_with(other, f64::powf)
    }

    /// Multiplies every element by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|value| value * factor)
    }

    /// Negates every element.
    #[must_use]
    pub fn negate(&self) -> Self {
        self.map(|value| -value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Self::Array(values)
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(values: [f64; N]) -> Self {
        Self::Array(values.to_vec())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Array(values) => {
                let values = values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{values}]")
            }
        }
    }
}
