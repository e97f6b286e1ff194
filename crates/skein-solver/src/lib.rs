//! Modifier stacks, the dependency graph, and the solver manager.
//!
//! A [`Solver`] computes one variable's value by applying priority-ranked
//! [`Modifier`]s to a default. The [`SolverManager`] owns a solver per
//! variable, wires the dependency graph from each modifier's declared
//! reads, and recomputes dependents aggressively: as soon as an edit
//! changes a value, everything downstream is brought up to date before
//! the call returns.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod error;
pub mod graph;
pub mod manager;
pub mod modifier;
pub mod solver;

pub use array::ArrayComponentModifier;
pub use error::SolveError;
pub use graph::{DepGraph, EdgeTag};
pub use manager::SolverManager;
pub use modifier::{CalcModifier, Modifier, ModifierKey, ModifierOp, Operand, Source};
pub use solver::{ProcessStep, Solver, SolverFactory};
