//! Package registry providers for deporder
//!
//! This crate defines the narrow provider interface the resolver talks to and
//! ships the providers behind it: an R runtime driven through `Rscript`, an
//! offline manifest file, and a memoizing cache that wraps either.

pub mod api;
pub mod cache;
pub mod client;
pub mod manifest;
pub mod provider;
pub mod runtime;
pub mod snapshot;

// Re-export main types
pub use api::InstalledPackage;
pub use cache::{CacheEntry, CacheStats, CachedProvider};
pub use client::{RscriptClient, RscriptConfig};
pub use manifest::{ManifestEntry, ManifestRegistry};
pub use provider::{DependencyProvider, PackageRegistry, VersionProvider};
pub use runtime::RuntimeRegistry;
pub use snapshot::{InstalledInfo, Snapshot};

use deporder_core::error::DeporderError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, DeporderError>;

#[cfg(test)]
pub(crate) mod test_support;
