//! The standard unit and prefix tables a [`UnitCatalog`](crate::UnitCatalog)
//! starts from.

use indexmap::IndexMap;

use crate::{
    dimension::{Dimension, DimensionMap},
    unit::Unit,
};

struct BuiltinPrefix {
    name: &'static str,
    value: f64,
    description: &'static str,
}

#[expect(clippy::too_many_lines, reason = "this is a list of builtin prefixes")]
fn builtin_prefixes_complete() -> impl Iterator<Item = BuiltinPrefix> {
    [
        BuiltinPrefix {
            name: "q",
            value: 1e-30,
            description: "quecto",
        },
        BuiltinPrefix {
            name: "r",
            value: 1e-27,
            description: "ronto",
        },
        BuiltinPrefix {
            name: "y",
            value: 1e-24,
            description: "yocto",
        },
        BuiltinPrefix {
            name: "z",
            value: 1e-21,
            description: "zepto",
        },
        BuiltinPrefix {
            name: "a",
            value: 1e-18,
            description: "atto",
        },
        BuiltinPrefix {
            name: "f",
            value: 1e-15,
            description: "femto",
        },
        BuiltinPrefix {
            name: "p",
            value: 1e-12,
            description: "pico",
        },
        BuiltinPrefix {
            name: "n",
            value: 1e-9,
            description: "nano",
        },
        BuiltinPrefix {
            name: "u",
            value: 1e-6,
            description: "micro",
        },
        BuiltinPrefix {
            name: "m",
            value: 1e-3,
            description: "milli",
        },
        BuiltinPrefix {
            name: "c",
            value: 1e-2,
            description: "centi",
        },
        BuiltinPrefix {
            name: "d",
            value: 1e-1,
            description: "deci",
        },
        BuiltinPrefix {
            name: "da",
            value: 1e1,
            description: "deca",
        },
        BuiltinPrefix {
            name: "h",
            value: 1e2,
            description: "hecto",
        },
        BuiltinPrefix {
            name: "k",
            value: 1e3,
            description: "kilo",
        },
        BuiltinPrefix {
            name: "M",
            value: 1e6,
            description: "mega",
        },
        BuiltinPrefix {
            name: "G",
            value: 1e9,
            description: "giga",
        },
        BuiltinPrefix {
            name: "T",
            value: 1e12,
            description: "tera",
        },
        BuiltinPrefix {
            name: "P",
            value: 1e15,
            description: "peta",
        },
        BuiltinPrefix {
            name: "E",
            value: 1e18,
            description: "exa",
        },
        BuiltinPrefix {
            name: "Z",
            value: 1e21,
            description: "zetta",
        },
        BuiltinPrefix {
            name: "Y",
            value: 1e24,
            description: "yotta",
        },
        BuiltinPrefix {
            name: "R",
            value: 1e27,
            description: "ronna",
        },
        BuiltinPrefix {
            name: "Q",
            value: 1e30,
            description: "quetta",
        },
    ]
    .into_iter()
}

/// The builtin unit prefixes, keyed by symbol.
#[must_use]
pub fn builtin_prefixes() -> IndexMap<String, f64> {
    builtin_prefixes_complete()
        .map(|prefix| (prefix.name.to_string(), prefix.value))
        .collect()
}

/// The builtin unit prefixes with their long names.
#[must_use]
pub fn builtin_prefixes_docs() -> IndexMap<String, (String, f64)> {
    builtin_prefixes_complete()
        .map(|prefix| {
            (
                prefix.name.to_string(),
                (prefix.description.to_string(), prefix.value),
            )
        })
        .collect()
}

fn dims<const N: usize>(dimensions: [(Dimension, f64); N]) -> DimensionMap {
    DimensionMap::new(IndexMap::from(dimensions))
}

struct BuiltinUnit {
    abbreviation: &'static str,
    aliases: IndexMap<&'static str, Unit>,
}

#[expect(clippy::too_many_lines, reason = "this is a list of builtin units")]
#[expect(clippy::unreadable_literal, reason = "this is a list of builtin units")]
fn builtin_units_complete() -> impl Iterator<Item = BuiltinUnit> {
    use Dimension::{
        Current, Distance, Information, LuminousIntensity, Mass, Substance, Temperature, Time,
    };

    struct UnitInfo {
        aliases: &'static [&'static str],
        magnitude: f64,
        dimensions: DimensionMap,
    }

    let units = [
        // === BASE UNITS ===
        UnitInfo {
            // the kilogram is the base unit of mass, so the gram is 1e-3 of a kilogram
            aliases: &["g", "gram", "grams"],
            magnitude: 1e-3,
            dimensions: dims([(Mass, 1.0)]),
        },
        UnitInfo {
            aliases: &["m", "meter", "meters", "metre", "metres"],
            magnitude: 1.0,
            dimensions: dims([(Distance, 1.0)]),
        },
        UnitInfo {
            aliases: &["s", "second", "seconds", "sec"],
            magnitude: 1.0,
            dimensions: dims([(Time, 1.0)]),
        },
        UnitInfo {
            aliases: &["K", "kelvin"],
            magnitude: 1.0,
            dimensions: dims([(Temperature, 1.0)]),
        },
        UnitInfo {
            aliases: &["A", "ampere", "amp"],
            magnitude: 1.0,
            dimensions: dims([(Current, 1.0)]),
        },
        UnitInfo {
            aliases: &["mol", "mole", "moles"],
            magnitude: 1.0,
            dimensions: dims([(Substance, 1.0)]),
        },
        UnitInfo {
            aliases: &["cd", "candela"],
            magnitude: 1.0,
            dimensions: dims([(LuminousIntensity, 1.0)]),
        },
        UnitInfo {
            aliases: &["bit", "bits"],
            magnitude: 1.0,
            dimensions: dims([(Information, 1.0)]),
        },
        // === DERIVED UNITS ===
        UnitInfo {
            aliases: &["V", "volt", "volts"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Distance, 2.0), (Time, -3.0), (Current, -1.0)]),
        },
        UnitInfo {
            aliases: &["W", "watt", "watts"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Distance, 2.0), (Time, -3.0)]),
        },
        UnitInfo {
            aliases: &["Hz", "hertz"],
            magnitude: 1.0,
            dimensions: dims([(Time, -1.0)]),
        },
        UnitInfo {
            aliases: &["J", "joule", "joules"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Distance, 2.0), (Time, -2.0)]),
        },
        UnitInfo {
            aliases: &["N", "newton", "newtons"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Distance, 1.0), (Time, -2.0)]),
        },
        UnitInfo {
            aliases: &["Pa", "pascal"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Distance, -1.0), (Time, -2.0)]),
        },
        UnitInfo {
            aliases: &["T", "tesla"],
            magnitude: 1.0,
            dimensions: dims([(Mass, 1.0), (Time, -2.0), (Current, -1.0)]),
        },
        // === VOLUME ===
        UnitInfo {
            aliases: &["L", "liter", "liters", "litre"],
            magnitude: 1e-3,
            dimensions: dims([(Distance, 3.0)]),
        },
        UnitInfo {
            aliases: &["cc"],
            magnitude: 1e-6,
            dimensions: dims([(Distance, 3.0)]),
        },
        // === TIME ===
        UnitInfo {
            aliases: &["min", "minute", "minutes"],
            magnitude: 60.0,
            dimensions: dims([(Time, 1.0)]),
        },
        UnitInfo {
            aliases: &["h", "hr", "hour", "hours"],
            magnitude: 3600.0,
            dimensions: dims([(Time, 1.0)]),
        },
        UnitInfo {
            aliases: &["day", "days"],
            magnitude: 86400.0,
            dimensions: dims([(Time, 1.0)]),
        },
        // === ASTRONOMICAL ===
        UnitInfo {
            // mean earth radius
            aliases: &["R_E"],
            magnitude: 6.371e6,
            dimensions: dims([(Distance, 1.0)]),
        },
        UnitInfo {
            aliases: &["AU", "au"],
            magnitude: 1.495978707e11,
            dimensions: dims([(Distance, 1.0)]),
        },
        // === DIMENSIONLESS ===
        UnitInfo {
            aliases: &["rad", "radian", "radians"],
            magnitude: 1.0,
            dimensions: DimensionMap::unitless(),
        },
        UnitInfo {
            aliases: &["deg", "degree", "degrees"],
            magnitude: std::f64::consts::PI / 180.0,
            dimensions: DimensionMap::unitless(),
        },
    ];

    units.into_iter().map(
        |UnitInfo {
             aliases,
             magnitude,
             dimensions,
         }| {
            // the first alias is the short form
            let abbreviation = aliases.first().copied().unwrap_or_default();
            let aliases = aliases
                .iter()
                .map(|alias| (*alias, Unit::named(*alias, dimensions.clone(), magnitude)))
                .collect();

            BuiltinUnit {
                abbreviation,
                aliases,
            }
        },
    )
}

/// The builtin units, keyed by every accepted alias.
///
/// Every alias maps to its own [`Unit`] so that the unit displays under the
/// name it was written with.
#[must_use]
pub fn builtin_units() -> IndexMap<String, Unit> {
    builtin_units_complete()
        .flat_map(|unit| {
            unit.aliases
                .into_iter()
                .map(|(alias, unit)| (alias.to_string(), unit))
        })
        .collect()
}

/// Maps every builtin unit alias to the short form of its unit.
///
/// For example, `meters` maps to `m` and `hour` maps to `h`.
#[must_use]
pub fn builtin_abbreviations() -> IndexMap<String, String> {
    builtin_units_complete()
        .flat_map(|unit| {
            let abbreviation = unit.abbreviation;
            unit.aliases
                .into_keys()
                .map(move |alias| (alias.to_string(), abbreviation.to_string()))
        })
        .collect()
}
