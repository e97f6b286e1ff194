//! Error types for the solver crate.

use crate::modifier::{ModifierKey, Source};
use skein_core::{Format, StoreError, VarId};
use skein_formula::{EvalError, SemanticsError};
use std::error::Error;
use std::fmt;

/// Errors from solver construction and the solver manager.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    /// `create_channel` called for a variable that already has a solver.
    DuplicateChannel {
        /// The variable.
        id: VarId,
    },
    /// An operation that requires an existing solver found none.
    UnknownChannel {
        /// The variable.
        id: VarId,
    },
    /// The variable library does not recognize the variable, so a solver
    /// may not be created implicitly for it.
    IllegalVariable {
        /// The variable.
        id: VarId,
    },
    /// The `(modifier, source)` pair is already attached to the solver.
    DuplicateModifier {
        /// The target variable.
        id: VarId,
        /// The modifier's value identity.
        key: ModifierKey,
        /// The attachment source.
        source: Source,
    },
    /// A modifier's format is not a subformat of the solver's format.
    FormatMismatch {
        /// The solver's format.
        expected: Format,
        /// The modifier's format.
        found: Format,
    },
    /// No default value is configured for the format, so a solver cannot
    /// be built for it.
    MissingDefault {
        /// The format lacking a default.
        format: Format,
    },
    /// A dependency cycle failed to reach a fixed point on its first lap.
    ///
    /// The path is the recursion stack at detection time; the first and
    /// last entries name the variable that was still changing.
    CycleDetected {
        /// The recursion path, outermost first.
        path: Vec<VarId>,
    },
    /// A modifier's formula failed the dependency or semantic pass.
    Semantics(SemanticsError),
    /// A modifier's formula failed to evaluate.
    Eval(EvalError),
    /// The result store rejected a computed value.
    Store(StoreError),
    /// An internal invariant was violated; indicates a bug.
    Internal {
        /// What was violated.
        detail: String,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateChannel { id } => {
                write!(f, "attempt to recreate channel for {id}")
            }
            Self::UnknownChannel { id } => {
                write!(f, "no channel was ever defined for {id}")
            }
            Self::IllegalVariable { id } => {
                write!(f, "variable {id} is not declared in the variable library")
            }
            Self::DuplicateModifier { id, key, source } => write!(
                f,
                "modifier {key} from source '{source}' is already attached to {id}"
            ),
            Self::FormatMismatch { expected, found } => {
                write!(f, "solver holds {expected}, cannot attach a {found} modifier")
            }
            Self::MissingDefault { format } => {
                write!(f, "no default value configured for format {format}")
            }
            Self::CycleDetected { path } => {
                write!(f, "diverging cycle in variable processing: ")?;
                for (i, id) in path.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" -> ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            Self::Semantics(err) => write!(f, "formula rejected: {err}"),
            Self::Eval(err) => write!(f, "evaluation failed: {err}"),
            Self::Store(err) => write!(f, "result store rejected a value: {err}"),
            Self::Internal { detail } => write!(f, "internal invariant violated: {detail}"),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Semantics(err) => Some(err),
            Self::Eval(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SemanticsError> for SolveError {
    fn from(err: SemanticsError) -> Self {
        Self::Semantics(err)
    }
}

impl From<EvalError> for SolveError {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

impl From<StoreError> for SolveError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
