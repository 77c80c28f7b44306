use indexmap::IndexMap;

use crate::{
    builtin,
    error::UnitError,
    parser::{self, UnitExpr},
    unit::{DisplayUnit, Unit},
};

/// The set of unit names a registry resolves unit annotations against.
///
/// A catalog starts from the builtin unit and prefix tables and can be
/// extended with custom units. Custom definitions are additive and are
/// visible to every later [`UnitCatalog::resolve`] call.
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    units: IndexMap<String, Unit>,
    prefixes: IndexMap<String, f64>,
    abbreviations: IndexMap<String, String>,
}

impl UnitCatalog {
    /// Creates a catalog holding the builtin units and prefixes.
    #[must_use]
    pub fn standard() -> Self {
        let mut prefixes = builtin::builtin_prefixes();
        // longer prefixes first so that `da` wins over `d`
        prefixes.sort_by(|a, _, b, _| b.len().cmp(&a.len()));

        Self {
            units: builtin::builtin_units(),
            prefixes,
            abbreviations: builtin::builtin_abbreviations(),
        }
    }

    /// Resolves a unit expression such as `kg/m^3` to a canonical unit.
    ///
    /// Surrounding whitespace and a single pair of square brackets are
    /// ignored, and an empty expression resolves to the unitless unit.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::UnitNotFound`] if the expression names an
    /// unknown unit or is not a unit expression at all.
    pub fn resolve(&self, spec: &str) -> Result<Unit, UnitError> {
        let spec = spec.trim();
        let spec = spec
            .strip_prefix('[')
            .and_then(|spec| spec.strip_suffix(']'))
            .map_or(spec, str::trim);

        if spec.is_empty() {
            return Ok(Unit::unitless());
        }

        let expr = parser::parse_unit_expr(spec).map_err(|_| UnitError::UnitNotFound {
            name: spec.to_string(),
        })?;
        self.evaluate(&expr)
    }

    fn evaluate(&self, expr: &UnitExpr) -> Result<Unit, UnitError> {
        match expr {
            UnitExpr::One => Ok(Unit::unitless()),
            UnitExpr::Name(name) => self.lookup(name),
            UnitExpr::Power { base, exponent } => Ok(self.evaluate(base)?.pow(*exponent)),
            UnitExpr::Multiply(left, right) => Ok(self.evaluate(left)? * self.evaluate(right)?),
            UnitExpr::Divide(left, right) => Ok(self.evaluate(left)? / self.evaluate(right)?),
        }
    }

    /// Looks up a single unit name, trying prefixed forms such as `km`
    /// when the name itself is not known.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::UnitNotFound`] if the name is unknown.
    pub fn lookup(&self, name: &str) -> Result<Unit, UnitError> {
        if let Some(unit) = self.units.get(name) {
            return Ok(unit.clone());
        }

        self.prefixes
            .iter()
            .find_map(|(prefix, value)| {
                let base = name.strip_prefix(prefix.as_str())?;
                let unit = self.units.get(base)?;
                Some(unit.clone().mul_magnitude(*value).renamed(name))
            })
            .ok_or_else(|| UnitError::UnitNotFound {
                name: name.to_string(),
            })
    }

    /// Defines `name` as `scale` times the unit `base`.
    ///
    /// A later definition with the same name replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a valid unit identifier, `base`
    /// cannot be resolved, or `scale` is zero, subnormal or not finite.
    pub fn define_custom(&mut self, name: &str, base: &str, scale: f64) -> Result<Unit, UnitError> {
        if !parser::is_unit_identifier(name) {
            return Err(UnitError::Syntax {
                input: name.to_string(),
                offset: 0,
            });
        }

        if !scale.is_normal() {
            return Err(UnitError::InvalidScale {
                name: name.to_string(),
                scale,
            });
        }

        let unit = self.resolve(base)?.mul_magnitude(scale).renamed(name);

        tracing::debug!(name, base, scale, "defined custom unit");
        self.units.insert(name.to_string(), unit.clone());

        Ok(unit)
    }

    /// Converts `value` expressed in `from` into `to`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::IncompatibleUnits`] if the dimensions differ.
    pub fn convert(&self, value: f64, from: &Unit, to: &Unit) -> Result<f64, UnitError> {
        Ok(value * self.conversion_factor(from, to)?)
    }

    /// The factor a value in `from` is multiplied by to express it in `to`.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::IncompatibleUnits`] if the dimensions differ.
    pub fn conversion_factor(&self, from: &Unit, to: &Unit) -> Result<f64, UnitError> {
        from.factor_to(to)
            .ok_or_else(|| UnitError::IncompatibleUnits {
                from: self.abbreviate(from),
                to: self.abbreviate(to),
            })
    }

    /// Checks whether two units share the same dimensions.
    #[must_use]
    pub fn compatible(&self, a: &Unit, b: &Unit) -> bool {
        a.dimensionally_eq(b)
    }

    /// The short display form of a unit.
    ///
    /// Long builtin names are replaced by their symbols, so a unit
    /// written as `meters/second` abbreviates to `m/s`.
    #[must_use]
    pub fn abbreviate(&self, unit: &Unit) -> String {
        abbreviate_display(&unit.display_unit, &self.abbreviations).to_string()
    }

    /// The builtin prefixes and their scale factors.
    #[must_use]
    pub const fn prefixes(&self) -> &IndexMap<String, f64> {
        &self.prefixes
    }

    /// Checks whether a unit name (possibly prefixed) is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn abbreviate_display(display: &DisplayUnit, abbreviations: &IndexMap<String, String>) -> DisplayUnit {
    match display {
        DisplayUnit::Unitless => DisplayUnit::Unitless,
        DisplayUnit::Unit { name, exponent } => DisplayUnit::Unit {
            name: abbreviations.get(name).unwrap_or(name).clone(),
            exponent: *exponent,
        },
        DisplayUnit::Multiply(left, right) => DisplayUnit::Multiply(
            Box::new(abbreviate_display(left, abbreviations)),
            Box::new(abbreviate_display(right, abbreviations)),
        ),
        DisplayUnit::Divide(left, right) => DisplayUnit::Divide(
            Box::new(abbreviate_display(left, abbreviations)),
            Box::new(abbreviate_display(right, abbreviations)),
        ),
        DisplayUnit::Power { base, exponent } => DisplayUnit::Power {
            base: Box::new(abbreviate_display(base, abbreviations)),
            exponent: *exponent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::is_close;

    #[test]
    fn equivalent_specs_resolve_equal() {
        let catalog = UnitCatalog::standard();
        let caret = catalog.resolve("kg/m^3").expect("should resolve");
        let stars = catalog.resolve("kg/m**3").expect("should resolve");
        assert!(caret.numerically_eq(&stars));

        let per_liter = catalog.resolve("g/L").expect("should resolve");
        assert!(caret.numerically_eq(&per_liter));
    }

    #[test]
    fn brackets_and_empty_specs() {
        let catalog = UnitCatalog::standard();
        let bracketed = catalog.resolve("[km/s]").expect("should resolve");
        assert_eq!(bracketed.to_string(), "km/s");
        assert!(catalog.resolve("").expect("should resolve").is_unitless());
        assert!(catalog.resolve("[]").expect("should resolve").is_unitless());
    }

    #[test]
    fn prefixed_units() {
        let catalog = UnitCatalog::standard();
        let nanotesla = catalog.resolve("nT").expect("should resolve");
        assert!(is_close(nanotesla.magnitude, 1e-9));
        assert_eq!(nanotesla.to_string(), "nT");

        let decameter = catalog.resolve("dam").expect("should resolve");
        assert!(is_close(decameter.magnitude, 10.0));
    }

    #[test]
    fn custom_units() {
        let mut catalog = UnitCatalog::standard();
        catalog.define_custom("mykm", "km", 2.0).expect("should define");
        catalog.define_custom("mygm", "g", 4.0).expect("should define");

        let mykm = catalog.resolve("mykm").expect("should resolve");
        let meter = catalog.resolve("m").expect("should resolve");
        let value = catalog.convert(1.0, &mykm, &meter).expect("should convert");
        assert!(is_close(value, 2000.0));

        let mygm = catalog.resolve("mygm").expect("should resolve");
        let kilogram = catalog.resolve("kg").expect("should resolve");
        let value = catalog.convert(1.0, &mygm, &kilogram).expect("should convert");
        assert!(is_close(value, 0.004));
    }

    #[test]
    fn invalid_custom_units() {
        let mut catalog = UnitCatalog::standard();
        let error = catalog
            .define_custom("bad", "m", 0.0)
            .expect_err("zero scale should fail");
        assert!(matches!(error, UnitError::InvalidScale { .. }));

        let error = catalog
            .define_custom("two words", "m", 1.0)
            .expect_err("invalid name should fail");
        assert!(matches!(error, UnitError::Syntax { .. }));
    }

    #[test]
    fn unknown_unit() {
        let catalog = UnitCatalog::standard();
        let error = catalog.resolve("runregistered").expect_err("should fail");
        assert_eq!(
            error,
            UnitError::UnitNotFound {
                name: "runregistered".to_string()
            }
        );
    }

    #[test]
    fn malformed_unit_is_not_found() {
        let catalog = UnitCatalog::standard();
        let error = catalog
            .resolve("unregistered units$")
            .expect_err("should fail");
        assert_eq!(
            error,
            UnitError::UnitNotFound {
                name: "unregistered units$".to_string()
            }
        );
    }

    #[test]
    fn incompatible_conversion() {
        let catalog = UnitCatalog::standard();
        let kilogram = catalog.resolve("kg").expect("should resolve");
        let meter = catalog.resolve("m").expect("should resolve");
        assert!(!catalog.compatible(&kilogram, &meter));

        let error = catalog
            .conversion_factor(&kilogram, &meter)
            .expect_err("should fail");
        assert_eq!(
            error,
            UnitError::IncompatibleUnits {
                from: "kg".to_string(),
                to: "m".to_string()
            }
        );
    }

    #[test]
    fn conversion_factors() {
        let catalog = UnitCatalog::standard();
        let km = catalog.resolve("km").expect("should resolve");
        let cm = catalog.resolve("cm").expect("should resolve");
        let factor = catalog.conversion_factor(&cm, &km).expect("should convert");
        assert!(is_close(factor, 1e-5));

        let hour = catalog.resolve("hr").expect("should resolve");
        let minute = catalog.resolve("min").expect("should resolve");
        let factor = catalog.conversion_factor(&hour, &minute).expect("should convert");
        assert!(is_close(factor, 60.0));
    }

    #[test]
    fn abbreviation() {
        let catalog = UnitCatalog::standard();
        let unit = catalog.resolve("meters/second^2").expect("should resolve");
        assert_eq!(catalog.abbreviate(&unit), "m/s^2");

        let unit = catalog.resolve("kg*km/s").expect("should resolve");
        assert_eq!(catalog.abbreviate(&unit), "kg*km/s");
    }
}
