//! Dependency resolution engine for deporder
//!
//! Builds the transitive dependency graph of a root package breadth-first,
//! orders it with Kahn's algorithm, and turns the order into an install plan
//! with base packages removed and versions attached.

pub mod graph;
pub mod order;
pub mod plan;

// Re-export main types
pub use graph::{resolve_full_dependency_graph, DependencyGraph, GraphBuilder};
pub use order::topological_sort;
pub use plan::{InstallPlan, InstallPlanner};

use deporder_core::error::DeporderError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, DeporderError>;
