//! Error types for the formula crate: parsing, semantic validation, and
//! evaluation.

use skein_core::Format;
use std::error::Error;
use std::fmt;

/// Errors from lexing or parsing formula text.
///
/// Offsets are byte positions into the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A character no token starts with.
    UnexpectedCharacter {
        /// Byte offset of the character.
        offset: usize,
    },
    /// A well-formed token in a position the grammar does not allow.
    UnexpectedToken {
        /// Debug rendering of the offending token.
        found: String,
        /// Byte offset of the token.
        offset: usize,
    },
    /// The source ended mid-expression.
    UnexpectedEnd,
    /// A complete expression was parsed but input remains.
    TrailingInput {
        /// Byte offset of the first unconsumed token.
        offset: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter { offset } => {
                write!(f, "unexpected character at offset {offset}")
            }
            Self::UnexpectedToken { found, offset } => {
                write!(f, "unexpected {found} at offset {offset}")
            }
            Self::UnexpectedEnd => write!(f, "formula ended unexpectedly"),
            Self::TrailingInput { offset } => {
                write!(f, "trailing input at offset {offset}")
            }
        }
    }
}

impl Error for ParseError {}

/// Errors from the semantic and dependency passes.
#[derive(Clone, Debug, PartialEq)]
pub enum SemanticsError {
    /// A numeric literal that is neither an integer nor a real.
    BadNumber {
        /// The literal text.
        text: String,
    },
    /// An identifier not asserted in or above the checking scope.
    UnknownVariable {
        /// The identifier.
        name: String,
        /// The scope the lookup started from.
        scope: String,
    },
    /// A function name the library does not know.
    UnknownFunction {
        /// The function name.
        name: String,
    },
    /// No operator action accepts the operand formats.
    BadOperand {
        /// The operator symbol.
        op: String,
        /// Format of the left (or only) operand.
        left: Format,
        /// Format of the right operand, absent for unary operators.
        right: Option<Format>,
    },
    /// A function called with the wrong number of arguments.
    WrongArgumentCount {
        /// The function name.
        function: String,
        /// Human-readable expected arity (e.g. `"1"`, `"2+"`).
        expected: &'static str,
        /// The arity found.
        found: usize,
    },
    /// A function argument that fails the function's own constraints.
    BadArgument {
        /// The function name.
        function: String,
        /// What was wrong.
        detail: String,
    },
    /// The formula's result format is not accepted where it is used.
    FormatMismatch {
        /// The format required by the context.
        expected: Format,
        /// The format the formula produces.
        found: Format,
    },
}

impl fmt::Display for SemanticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadNumber { text } => write!(f, "'{text}' is not a valid number literal"),
            Self::UnknownVariable { name, scope } => {
                write!(f, "variable '{name}' is not declared in or above scope '{scope}'")
            }
            Self::UnknownFunction { name } => write!(f, "unknown function '{name}'"),
            Self::BadOperand { op, left, right } => match right {
                Some(right) => {
                    write!(f, "operator '{op}' cannot combine {left} and {right}")
                }
                None => write!(f, "operator '{op}' cannot process {left}"),
            },
            Self::WrongArgumentCount {
                function,
                expected,
                found,
            } => write!(
                f,
                "function '{function}' expects {expected} argument(s), found {found}"
            ),
            Self::BadArgument { function, detail } => {
                write!(f, "bad argument to '{function}': {detail}")
            }
            Self::FormatMismatch { expected, found } => {
                write!(f, "formula produces {found} where {expected} is required")
            }
        }
    }
}

impl Error for SemanticsError {}

/// Errors from evaluating a formula.
///
/// A formula that passed the semantic check only fails evaluation through
/// value-level operand constraints or a missing macro-argument frame; the
/// `Internal` variant marks states the passes guarantee unreachable.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// A function name the library does not know.
    UnknownFunction {
        /// The function name.
        name: String,
    },
    /// An operand violates a value-level operator constraint.
    BadOperand {
        /// The operator symbol.
        op: String,
        /// What was violated.
        detail: String,
    },
    /// `arg(n)` evaluated with no argument at index `n`.
    MissingArgument {
        /// The requested index.
        index: usize,
    },
    /// An internal invariant was violated; indicates a bug.
    Internal {
        /// What was violated.
        detail: String,
    },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFunction { name } => write!(f, "unknown function '{name}'"),
            Self::BadOperand { op, detail } => {
                write!(f, "operator '{op}' rejected its operands: {detail}")
            }
            Self::MissingArgument { index } => {
                write!(f, "no macro argument at index {index}")
            }
            Self::Internal { detail } => write!(f, "internal invariant violated: {detail}"),
        }
    }
}

impl Error for EvalError {}
