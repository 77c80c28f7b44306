use symreg_expr::{EvalError, ParserError, ParserErrorReason};
use symreg_unit::UnitError;

/// An error raised by a registry operation.
///
/// A failed operation leaves the registry unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Symbol resolution collides with existing bindings
    #[error("ambiguous signature for `{name}`: {reason}")]
    AmbiguousSignature {
        /// The name being declared
        name: String,
        /// What made the signature ambiguous
        reason: String,
    },
    /// An applied function is neither registered nor builtin
    #[error("`{name}` is not a registered or builtin function")]
    UndefinedFunction {
        /// The function name
        name: String,
    },
    /// The declaration uses syntax that is deliberately not supported
    #[error("unsupported declaration syntax at offset {offset} of `{input}`")]
    UnsupportedSyntax {
        /// The declaration text
        input: String,
        /// The byte offset of the offending token
        offset: usize,
    },
    /// The declaration could not be parsed
    #[error("could not parse `{input}`: {source}")]
    Parser {
        /// The declaration text
        input: String,
        /// The underlying parser error
        source: ParserError,
    },
    /// Two units that must agree have different dimensions
    #[error("incompatible units: cannot convert `{from}` to `{to}`")]
    IncompatibleUnits {
        /// The unit being converted
        from: String,
        /// The unit it was expected to match
        to: String,
    },
    /// A unit annotation names an unknown unit
    #[error("unit `{name}` not found")]
    UnitNotFound {
        /// The unknown unit name
        name: String,
    },
    /// Any other unit error, such as a malformed unit expression
    #[error(transparent)]
    Unit(UnitError),
    /// The key does not name a registered function
    #[error("`{name}` is not a registered function")]
    AttributeNotFound {
        /// The requested name
        name: String,
    },
    /// An expression was evaluated without a name to assign it to
    #[error("`{input}` has no assignment target; write `name = expression`")]
    MissingAssignmentTarget {
        /// The expression text
        input: String,
    },
    /// A registered function failed while being evaluated
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl RegistryError {
    pub(crate) fn ambiguous(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AmbiguousSignature {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parser(input: &str, error: ParserError) -> Self {
        match error.reason {
            ParserErrorReason::MultipleAssignments | ParserErrorReason::AssignmentInKey => {
                Self::UnsupportedSyntax {
                    input: input.to_string(),
                    offset: error.offset,
                }
            }
            ParserErrorReason::ExpectedExpression
            | ParserErrorReason::MissingOperand
            | ParserErrorReason::UnclosedParen
            | ParserErrorReason::UnclosedUnit
            | ParserErrorReason::UnclosedDelimiter
            | ParserErrorReason::ExpectedSignature
            | ParserErrorReason::ExpectedAssignment
            | ParserErrorReason::UnexpectedToken
            | ParserErrorReason::Nom(_) => Self::Parser {
                input: input.to_string(),
                source: error,
            },
        }
    }
}

impl From<UnitError> for RegistryError {
    fn from(error: UnitError) -> Self {
        match error {
            UnitError::UnitNotFound { name } => Self::UnitNotFound { name },
            UnitError::IncompatibleUnits { from, to } => Self::IncompatibleUnits { from, to },
            error @ (UnitError::Syntax { .. } | UnitError::InvalidScale { .. }) => Self::Unit(error),
        }
    }
}

/// An update function failed during a simulation step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{key}: {source}")]
pub struct SimulationError {
    /// The state key whose update failed
    pub key: String,
    /// The error raised by the update function
    pub source: EvalError,
}
