//! Errors raised while resolving or converting units

/// An error raised by the unit catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// A unit name is neither builtin, prefixed, nor custom-defined.
    #[error("unit `{name}` not found")]
    UnitNotFound {
        /// The unrecognized name
        name: String,
    },
    /// Two units do not share the same dimensions.
    #[error("incompatible units: cannot convert `{from}` to `{to}`")]
    IncompatibleUnits {
        /// The unit being converted from
        from: String,
        /// The unit being converted to
        to: String,
    },
    /// A unit expression could not be parsed.
    #[error("invalid unit expression `{input}` at offset {offset}")]
    Syntax {
        /// The unit expression
        input: String,
        /// The byte offset where parsing failed
        offset: usize,
    },
    /// A custom unit was defined with a zero or non-finite scale.
    #[error("invalid scale factor {scale} for unit `{name}`")]
    InvalidScale {
        /// The name of the custom unit
        name: String,
        /// The rejected scale factor
        scale: f64,
    },
}
