//! Core types for the Skein formula engine.
//!
//! This is the leaf crate with zero internal Skein dependencies. It defines
//! the fundamental abstractions used throughout the Skein workspace:
//! typed values and formats, scope trees and instances, variable
//! identifiers, the variable library, and the typed variable store.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod id;
pub mod library;
pub mod scope;
pub mod store;
pub mod value;

// Re-export core types at crate root for convenience.
pub use error::{FormatError, ScopeError, StoreError, VariableError};
pub use format::{Format, FormatRegistry};
pub use id::{InstanceId, ScopeId, VarId};
pub use library::VariableLibrary;
pub use scope::ScopeWorld;
pub use store::VariableStore;
pub use value::Value;
