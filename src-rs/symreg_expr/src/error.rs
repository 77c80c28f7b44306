//! Errors raised while parsing or evaluating expressions

use crate::parser::Span;

/// The reason a declaration or expression failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParserErrorReason {
    /// An expression was expected
    #[error("expected an expression")]
    ExpectedExpression,
    /// A binary operator is missing its right operand
    #[error("operator is missing its second operand")]
    MissingOperand,
    /// A `(`, `{` or `\left(` was never closed
    #[error("unclosed parenthesis")]
    UnclosedParen,
    /// A `[` unit annotation was never closed
    #[error("unclosed unit annotation")]
    UnclosedUnit,
    /// A `$` or `\begin{equation}` wrapper was never closed
    #[error("unclosed delimiter")]
    UnclosedDelimiter,
    /// The left-hand side is not a function signature
    #[error("expected a function signature")]
    ExpectedSignature,
    /// A declaration has no `=`
    #[error("expected `=` followed by an expression")]
    ExpectedAssignment,
    /// A declaration contains more than one `=`
    #[error("more than one `=` in declaration")]
    MultipleAssignments,
    /// An assignment key contains an `=`
    #[error("assignment key contains `=`")]
    AssignmentInKey,
    /// Input remained after a complete parse
    #[error("unexpected token")]
    UnexpectedToken,
    /// A low-level parser error
    #[error("parser error ({0:?})")]
    Nom(nom::error::ErrorKind),
}

/// An error that occurred during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at offset {offset}")]
pub struct ParserError {
    /// The reason for the error
    pub reason: ParserErrorReason,
    /// The byte offset in the source where the error occurred
    pub offset: usize,
}

impl ParserError {
    /// Creates a new parser error.
    #[must_use]
    pub const fn new(reason: ParserErrorReason, offset: usize) -> Self {
        Self { reason, offset }
    }

    pub(crate) const fn with_reason(self, reason: ParserErrorReason) -> Self {
        Self { reason, ..self }
    }
}

impl<'a> nom::error::ParseError<Span<'a>> for ParserError {
    fn from_error_kind(input: Span<'a>, kind: nom::error::ErrorKind) -> Self {
        #[expect(
            clippy::wildcard_enum_match_arm,
            reason = "this will only ever care about the EOF error kind"
        )]
        let reason = match kind {
            // `all_consuming` reports leftover input as EOF
            nom::error::ErrorKind::Eof => ParserErrorReason::UnexpectedToken,
            _ => ParserErrorReason::Nom(kind),
        };

        Self {
            reason,
            offset: input.location_offset(),
        }
    }

    fn append(_input: Span<'a>, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> nom::error::FromExternalError<Span<'a>, E> for ParserError {
    fn from_external_error(input: Span<'a>, kind: nom::error::ErrorKind, _error: E) -> Self {
        <Self as nom::error::ParseError<Span<'a>>>::from_error_kind(input, kind)
    }
}

/// An error raised while evaluating an expression or calling a function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Two arrays of different lengths were combined
    #[error("shape mismatch: cannot broadcast arrays of length {left} and {right}")]
    ShapeMismatch {
        /// Length of the left operand
        left: usize,
        /// Length of the right operand
        right: usize,
    },
    /// A function was called with the wrong number of arguments
    #[error("`{name}` takes {expected} argument(s) but {found} were given")]
    ArgumentCount {
        /// The function name
        name: String,
        /// The number of parameters
        expected: usize,
        /// The number of arguments supplied
        found: usize,
    },
    /// A parameter without a default received no value
    #[error("`{name}` is missing a value for argument `{param}`")]
    MissingArgument {
        /// The function name
        name: String,
        /// The parameter without a value
        param: String,
    },
    /// An applied function is neither registered nor builtin
    #[error("unknown function `{name}`")]
    UnknownFunction {
        /// The function name
        name: String,
    },
    /// A symbol has no value
    #[error("symbol `{name}` has no value")]
    UnboundSymbol {
        /// The symbol name
        name: String,
    },
    /// A function expected a scalar but received an array
    #[error("`{name}` expects a scalar argument")]
    ExpectedScalar {
        /// The function name
        name: String,
    },
    /// An error raised by a user-supplied function
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    /// Creates an error raised by user code.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
