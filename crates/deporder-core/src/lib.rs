//! # deporder-core
//!
//! Core types and utilities shared across all deporder crates.
//!
//! This crate provides:
//! - `DependencyBatch` and `DependencyKind` for provider answers
//! - `VersionRecord` and `ResolvedVersion` for orchestrated output
//! - `DeporderError` enum for unified error handling
//! - Package name validation helpers
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{DeporderError, DeporderResult};
pub use types::{DependencyBatch, DependencyKind, PackageName, ResolvedVersion, VersionRecord};
