//! deporder benchmarking suite
//!
//! Benchmarks for graph construction, ordering, planning, and parsing of
//! provider output.

pub mod common;

pub use common::*;
