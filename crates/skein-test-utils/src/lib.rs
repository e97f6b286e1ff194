//! Test utilities and fixtures for Skein development.
//!
//! [`TestWorld`] bundles a preconfigured runtime and manager with helper
//! methods for the patterns integration tests repeat: asserting global
//! variables, seeding values, and attaching formula modifiers.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::TestWorld;
