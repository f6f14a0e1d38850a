//! Core data types for deporder.
//!
//! This module provides the fundamental types used throughout the workspace:
//! - Dependency batches returned by providers
//! - Dependency kinds (which DESCRIPTION fields count as edges)
//! - Version records attached to the final installation order

pub mod dependency;
pub mod version;

/// Opaque, case-sensitive package identifier
pub type PackageName = String;

// Re-export all public types
pub use dependency::{DependencyBatch, DependencyKind};
pub use version::{ResolvedVersion, VersionRecord};
