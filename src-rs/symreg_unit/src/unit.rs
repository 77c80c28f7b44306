use std::{fmt, ops};

use crate::{dimension::DimensionMap, util::is_close};

/// A canonical physical unit.
///
/// A unit has three parts: a dimension map, a magnitude relative to the
/// SI base units of those dimensions, and display information.
///
/// Units should rarely be compared for equality. If you are looking
/// for compatibility, you probably actually want
/// [`Unit::dimensionally_eq`]. If you would like to check if two units
/// denote exactly the same scale, use [`Unit::numerically_eq`].
#[derive(Debug, Clone)]
pub struct Unit {
    /// The dimensions of the unit
    pub dimension_map: DimensionMap,
    /// The magnitude of the unit (e.g. 1000 for km)
    pub magnitude: f64,
    /// The display information for the unit
    pub display_unit: DisplayUnit,
}

impl Unit {
    /// Creates a unitless unit.
    #[must_use]
    pub fn unitless() -> Self {
        Self {
            dimension_map: DimensionMap::unitless(),
            magnitude: 1.0,
            display_unit: DisplayUnit::Unitless,
        }
    }

    /// Creates a named unit with the given dimensions and magnitude.
    #[must_use]
    pub fn named(name: impl Into<String>, dimension_map: DimensionMap, magnitude: f64) -> Self {
        Self {
            dimension_map,
            magnitude,
            display_unit: DisplayUnit::Unit {
                name: name.into(),
                exponent: 1.0,
            },
        }
    }

    /// Determines if the unit is unitless.
    #[must_use]
    pub fn is_unitless(&self) -> bool {
        self.dimension_map.is_unitless()
    }

    /// Replaces the display expression of the unit with a single name.
    #[must_use]
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            display_unit: DisplayUnit::Unit {
                name: name.into(),
                exponent: 1.0,
            },
            ..self
        }
    }

    /// Multiplies the unit by the given magnitude.
    #[must_use]
    pub fn mul_magnitude(self, magnitude: f64) -> Self {
        Self {
            magnitude: self.magnitude * magnitude,
            ..self
        }
    }

    /// Raises the unit to the power of the given exponent.
    #[must_use]
    pub fn pow(self, exponent: f64) -> Self {
        Self {
            dimension_map: self.dimension_map.pow(exponent),
            magnitude: self.magnitude.powf(exponent),
            display_unit: self.display_unit.pow(exponent),
        }
    }

    /// Determines if the unit has the same dimensions as the given unit.
    ///
    /// For example, `km` and `m` are dimensionally equal, while `km`
    /// and `km/h` are not.
    #[must_use]
    pub fn dimensionally_eq(&self, other: &Self) -> bool {
        self.dimension_map == other.dimension_map
    }

    /// Determines if the unit has the same dimensions and magnitude as the
    /// given unit, regardless of how either one is displayed.
    ///
    /// For example, `kg/m^3` and `g/L` are numerically equal, while
    /// `km` and `m` are not.
    #[must_use]
    pub fn numerically_eq(&self, other: &Self) -> bool {
        is_close(self.magnitude, other.magnitude) && self.dimensionally_eq(other)
    }

    /// The factor that converts a value in this unit into `target`.
    ///
    /// Returns `None` if the units are not dimensionally equal.
    #[must_use]
    pub fn factor_to(&self, target: &Self) -> Option<f64> {
        self.dimensionally_eq(target)
            .then(|| self.magnitude / target.magnitude)
    }
}

impl ops::Mul for Unit {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            dimension_map: self.dimension_map * rhs.dimension_map,
            magnitude: self.magnitude * rhs.magnitude,
            display_unit: self.display_unit * rhs.display_unit,
        }
    }
}

impl ops::Div for Unit {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self {
            dimension_map: self.dimension_map / rhs.dimension_map,
            magnitude: self.magnitude / rhs.magnitude,
            display_unit: self.display_unit / rhs.display_unit,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_unit)
    }
}

/// The human-readable form of a unit.
///
/// It keeps the structure of the expression the unit was built from, so
/// `kg*km/s` displays as written rather than in SI base units.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUnit {
    /// Unitless `1`
    Unitless,
    /// A single unit
    Unit {
        /// The name of the unit
        name: String,
        /// The exponent of the unit
        exponent: f64,
    },
    /// A multiplied unit
    Multiply(Box<DisplayUnit>, Box<DisplayUnit>),
    /// A divided unit
    Divide(Box<DisplayUnit>, Box<DisplayUnit>),
    /// A power unit
    Power {
        /// The base of the power unit
        base: Box<DisplayUnit>,
        /// The exponent of the power unit
        exponent: f64,
    },
}

impl DisplayUnit {
    /// Raises the display unit to the power of the given exponent.
    #[must_use]
    pub fn pow(self, pow_exponent: f64) -> Self {
        match self {
            Self::Unitless => Self::Unitless,
            Self::Unit { name, exponent } => Self::Unit {
                name,
                exponent: exponent * pow_exponent,
            },
            Self::Multiply(_, _) | Self::Divide(_, _) => Self::Power {
                base: Box::new(self),
                exponent: pow_exponent,
            },
            Self::Power { base, exponent } => Self::Power {
                base,
                exponent: exponent * pow_exponent,
            },
        }
    }

    const fn is_compound(&self) -> bool {
        matches!(self, Self::Multiply(_, _) | Self::Divide(_, _))
    }
}

impl ops::Mul for DisplayUnit {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Unitless, other) | (other, Self::Unitless) => other,
            (lhs, rhs) => Self::Multiply(Box::new(lhs), Box::new(rhs)),
        }
    }
}

impl ops::Div for DisplayUnit {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        match rhs {
            Self::Unitless => self,
            rhs => Self::Divide(Box::new(self), Box::new(rhs)),
        }
    }
}

fn write_exponent(f: &mut fmt::Formatter<'_>, exponent: f64) -> fmt::Result {
    if is_close(exponent, 1.0) {
        Ok(())
    } else if exponent < 0.0 || exponent.fract() != 0.0 {
        write!(f, "^({exponent})")
    } else {
        write!(f, "^{exponent}")
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unitless => write!(f, "1"),
            Self::Unit { name, exponent } => {
                write!(f, "{name}")?;
                write_exponent(f, *exponent)
            }
            Self::Multiply(left, right) => {
                write!(f, "{left}*")?;
                if matches!(**right, Self::Divide(_, _)) {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Self::Divide(left, right) => {
                write!(f, "{left}/")?;
                if right.is_compound() {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Self::Power { base, exponent } => {
                if base.is_compound() {
                    write!(f, "({base})")?;
                } else {
                    write!(f, "{base}")?;
                }
                write_exponent(f, *exponent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::dimension::Dimension;

    fn meter() -> Unit {
        Unit::named("m", DimensionMap::base(Dimension::Distance), 1.0)
    }

    fn kilometer() -> Unit {
        Unit::named("km", DimensionMap::base(Dimension::Distance), 1000.0)
    }

    fn second() -> Unit {
        Unit::named("s", DimensionMap::base(Dimension::Time), 1.0)
    }

    #[test]
    fn display_of_composed_unit() {
        let gram = Unit::named("g", DimensionMap::base(Dimension::Mass), 1e-3);
        let unit = gram * (kilometer() / second());
        assert_eq!(unit.to_string(), "g*km/s");
    }

    #[test]
    fn display_of_powers() {
        let volume = meter().pow(3.0);
        assert_eq!(volume.to_string(), "m^3");

        let per_second = Unit::unitless() / second();
        assert_eq!(per_second.to_string(), "1/s");

        let inverse = second().pow(-1.0);
        assert_eq!(inverse.to_string(), "s^(-1)");
    }

    #[test]
    fn conversion_factor_between_scales() {
        let factor = kilometer().factor_to(&meter());
        assert_eq!(factor, Some(1000.0));
        assert_eq!(meter().factor_to(&second()), None);
    }

    #[test]
    fn numeric_equality_ignores_display() {
        let composed = kilometer() / second();
        let speed = Unit {
            dimension_map: DimensionMap::new(IndexMap::from([
                (Dimension::Distance, 1.0),
                (Dimension::Time, -1.0),
            ])),
            magnitude: 1000.0,
            display_unit: DisplayUnit::Unitless,
        };
        assert!(composed.numerically_eq(&speed));
        assert!(!composed.numerically_eq(&(meter() / second())));
        assert!(composed.dimensionally_eq(&(meter() / second())));
    }
}
