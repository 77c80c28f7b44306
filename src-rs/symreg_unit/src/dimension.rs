use std::{fmt, ops};

use indexmap::IndexMap;

use crate::util::is_close;

/// The dimension of a base unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Base unit is 'kilogram'
    Mass,
    /// Base unit is 'meter'
    Distance,
    /// Base unit is 'second'
    Time,
    /// Base unit is 'kelvin'
    Temperature,
    /// Base unit is 'ampere'
    Current,
    /// Base unit is 'mole'
    Substance,
    /// Base unit is 'candela'
    LuminousIntensity,
    /// Base unit is 'bit'
    Information,
}

impl Dimension {
    /// The symbol of the SI base unit for this dimension.
    #[must_use]
    pub const fn base_symbol(self) -> &'static str {
        match self {
            Self::Mass => "kg",
            Self::Distance => "m",
            Self::Time => "s",
            Self::Temperature => "K",
            Self::Current => "A",
            Self::Substance => "mol",
            Self::LuminousIntensity => "cd",
            Self::Information => "bit",
        }
    }
}

/// A map of dimensions and their exponents.
///
/// For example, "m/s" is represented as
/// `DimensionMap(IndexMap::from([(Dimension::Distance, 1.0), (Dimension::Time, -1.0)]))`.
///
/// Dimensions with a zero exponent are never stored.
#[derive(Debug, Clone, Default)]
pub struct DimensionMap(IndexMap<Dimension, f64>);

impl DimensionMap {
    /// Creates a dimension map from dimensions and their exponents.
    #[must_use]
    pub fn new(dimensions: IndexMap<Dimension, f64>) -> Self {
        Self(
            dimensions
                .into_iter()
                .filter(|(_, exponent)| !is_close(*exponent, 0.0))
                .collect(),
        )
    }

    /// Creates a dimension map for a single base dimension.
    #[must_use]
    pub fn base(dimension: Dimension) -> Self {
        Self(IndexMap::from([(dimension, 1.0)]))
    }

    /// Creates a dimensionless map.
    #[must_use]
    pub fn unitless() -> Self {
        Self(IndexMap::new())
    }

    /// Checks if the map has no dimensions.
    #[must_use]
    pub fn is_unitless(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the exponent of the given dimension, zero if absent.
    #[must_use]
    pub fn exponent(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(0.0)
    }

    /// Iterates over the dimensions and their exponents.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        self.0.iter().map(|(dimension, exponent)| (*dimension, *exponent))
    }

    /// Raises every dimension to the power of the given exponent.
    #[must_use]
    pub fn pow(self, exponent: f64) -> Self {
        Self::new(
            self.0
                .into_iter()
                .map(|(key, value)| (key, value * exponent))
                .collect(),
        )
    }
}

impl PartialEq for DimensionMap {
    /// Checks if two dimension maps are equal.
    ///
    /// This is a fuzzy comparison: exponents are compared with `is_close`.
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        self.0.iter().all(|(dimension, value)| {
            let other_value = other.0.get(dimension);
            other_value.is_some_and(|other_value| is_close(*other_value, *value))
        })
    }
}

impl ops::Mul for DimensionMap {
    type Output = Self;

    /// For example, `(m/s) * (kg) = (kg*m/s)`
    fn mul(self, rhs: Self) -> Self::Output {
        let mut result = self.0;

        for (key, value) in rhs.0 {
            result
                .entry(key)
                .and_modify(|v| *v += value)
                .or_insert(value);
        }

        Self::new(result)
    }
}

impl ops::Div for DimensionMap {
    type Output = Self;

    /// For example, `(kg*m/s) / (kg) = (m/s)`
    fn div(self, rhs: Self) -> Self::Output {
        let mut result = self.0;

        for (key, value) in rhs.0 {
            #[expect(
                clippy::suspicious_arithmetic_impl,
                reason = "division is defined as subtraction of the exponent"
            )]
            result
                .entry(key)
                .and_modify(|v| *v -= value)
                .or_insert(-value);
        }

        Self::new(result)
    }
}

impl fmt::Display for DimensionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "1");
        }

        let mut first = true;
        for (dimension, exponent) in &self.0 {
            if !first {
                write!(f, "*")?;
            }
            first = false;

            write!(f, "{}", dimension.base_symbol())?;
            if !is_close(*exponent, 1.0) {
                write!(f, "^{exponent}")?;
            }
        }

        Ok(())
    }
}
