//! Error types for the core crate, organized by subsystem: format
//! resolution, scope management, variable assertion, and the typed store.

use crate::format::Format;
use crate::id::VarId;
use std::error::Error;
use std::fmt;

/// Errors from format name resolution and text parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum FormatError {
    /// The format name is not registered and is not a structural name.
    UnknownFormat {
        /// The unresolvable name.
        name: String,
    },
    /// The text does not parse as a value of the format.
    UnparsableValue {
        /// The target format.
        format: Format,
        /// The offending text.
        text: String,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat { name } => write!(f, "unknown format name '{name}'"),
            Self::UnparsableValue { format, text } => {
                write!(f, "'{text}' is not a valid {format} value")
            }
        }
    }
}

impl Error for FormatError {}

/// Errors from scope definition and instance creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeError {
    /// Scope name is empty or edge-whitespaced.
    BadName {
        /// The rejected name.
        name: String,
    },
    /// The instance's parent does not instantiate the scope's parent.
    ParentMismatch {
        /// Name of the scope being instantiated.
        scope: String,
        /// Name of the scope's declared parent, if any.
        expected_parent: Option<String>,
    },
    /// The global scope already has its one instance.
    GlobalAlreadyOpen,
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadName { name } => write!(f, "illegal scope name '{name}'"),
            Self::ParentMismatch {
                scope,
                expected_parent,
            } => match expected_parent {
                Some(parent) => write!(
                    f,
                    "scope '{scope}' must be instantiated under an instance of '{parent}'"
                ),
                None => write!(f, "scope '{scope}' takes no parent instance"),
            },
            Self::GlobalAlreadyOpen => {
                write!(f, "the global scope has exactly one instance")
            }
        }
    }
}

impl Error for ScopeError {}

/// Errors from variable assertion and identifier resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum VariableError {
    /// Variable name is empty or edge-whitespaced.
    BadName {
        /// The rejected name.
        name: String,
    },
    /// The name is already asserted in this scope with a different format.
    ConflictingFormat {
        /// The variable name.
        name: String,
        /// The scope holding the existing assertion.
        scope: String,
        /// The format already asserted.
        existing: Format,
        /// The format of the failed re-assertion.
        requested: Format,
    },
    /// The name is already asserted in an ancestor or descendant scope.
    ShadowedName {
        /// The variable name.
        name: String,
        /// The scope where the name is already asserted.
        asserted_in: String,
        /// The scope of the rejected assertion.
        rejected_in: String,
    },
    /// The name is not asserted anywhere visible from the lookup context.
    UnknownVariable {
        /// The unresolvable name.
        name: String,
        /// The scope the lookup started from.
        scope: String,
    },
}

impl fmt::Display for VariableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadName { name } => write!(f, "illegal variable name '{name}'"),
            Self::ConflictingFormat {
                name,
                scope,
                existing,
                requested,
            } => write!(
                f,
                "variable '{name}' in scope '{scope}' is {existing}, cannot re-assert as {requested}"
            ),
            Self::ShadowedName {
                name,
                asserted_in,
                rejected_in,
            } => write!(
                f,
                "variable '{name}' in scope '{rejected_in}' would shadow the assertion in '{asserted_in}'"
            ),
            Self::UnknownVariable { name, scope } => {
                write!(f, "variable '{name}' is not asserted in or above scope '{scope}'")
            }
        }
    }
}

impl Error for VariableError {}

/// Errors from the typed variable store.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreError {
    /// The value is not accepted by the variable's format.
    FormatMismatch {
        /// The variable being written.
        id: VarId,
        /// The variable's declared format.
        expected: Format,
        /// The format of the rejected value.
        actual: Format,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FormatMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "variable {id} holds {expected}, cannot store a {actual} value"
            ),
        }
    }
}

impl Error for StoreError {}
