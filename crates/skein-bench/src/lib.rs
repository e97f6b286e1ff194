//! Benchmark-only crate; see `benches/` for the criterion suites.

#![forbid(unsafe_code)]
