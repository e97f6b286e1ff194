//! Skein: a reactive formula engine.
//!
//! Skein stores named, typed variables organized into nested scopes,
//! parses arithmetic/logical/string formulas over them, and keeps every
//! computed value consistent as priority-ranked modifiers are attached
//! and detached. This is the top-level facade crate re-exporting the
//! public API from the Skein sub-crates; for most users, adding `skein`
//! as a single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use skein::prelude::*;
//! use std::sync::Arc;
//!
//! // Declare two integer variables in the global scope.
//! let mut runtime = FormulaRuntime::new();
//! let global = runtime.scopes.global_scope();
//! runtime.assert_variable("a", global, Format::Integer).unwrap();
//! runtime.assert_variable("b", global, Format::Integer).unwrap();
//!
//! // Integers default to zero.
//! let mut factory = SolverFactory::new();
//! factory.set_default(Format::Integer, Value::Int(0)).unwrap();
//! let mut manager = SolverManager::new(factory);
//!
//! let here = runtime.scopes.global_instance();
//! let a = runtime.identifier_for(here, "a").unwrap();
//! let b = runtime.identifier_for(here, "b").unwrap();
//!
//! // a = 3, b = a + 2; b tracks a from now on.
//! manager
//!     .add_modifier(
//!         &runtime,
//!         a.clone(),
//!         Arc::new(CalcModifier::set(Value::Int(3), here)),
//!         Source::new("seed"),
//!     )
//!     .unwrap();
//! let formula = Formula::parse("a+2", Format::Integer).unwrap();
//! manager
//!     .add_modifier(
//!         &runtime,
//!         b.clone(),
//!         Arc::new(CalcModifier::add_formula(formula, here)),
//!         Source::new("bonus"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(manager.value_of(&a), Some(&Value::Int(3)));
//! assert_eq!(manager.value_of(&b), Some(&Value::Int(5)));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `skein-core` | Values, formats, IDs, scopes, the variable library and store |
//! | [`formula`] | `skein-formula` | Lexer, parser, AST, the three passes, function and operator libraries |
//! | [`solver`] | `skein-solver` | Modifiers, solvers, the dependency graph, and the solver manager |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types: values, formats, IDs, scopes, variables (`skein-core`).
pub use skein_core as types;

/// Formula parsing, validation, and evaluation (`skein-formula`).
pub use skein_formula as formula;

/// Modifier stacks, dependency graph, and the solver manager
/// (`skein-solver`).
pub use skein_solver as solver;

/// Common imports for typical Skein usage.
///
/// ```rust
/// use skein::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use skein_core::{
        Format, FormatRegistry, InstanceId, ScopeId, ScopeWorld, Value, VarId,
        VariableLibrary, VariableStore,
    };

    // Formula surface
    pub use skein_formula::{Formula, FormulaRuntime, FunctionLibrary, OperatorLibrary};

    // Solver surface
    pub use skein_solver::{
        ArrayComponentModifier, CalcModifier, Modifier, ModifierKey, ModifierOp, Operand,
        ProcessStep, Solver, SolverFactory, SolverManager, Source,
    };

    // Errors
    pub use skein_core::{FormatError, ScopeError, StoreError, VariableError};
    pub use skein_formula::{EvalError, ParseError, SemanticsError};
    pub use skein_solver::SolveError;
}
