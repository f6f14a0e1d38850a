//! Provider traits the resolver depends on
//!
//! Implementations are free to hit a live runtime, a file or a cache. All
//! calls are blocking.

use deporder_core::DependencyBatch;

use crate::RegistryResult;

/// Source of direct dependency lists
pub trait DependencyProvider {
    /// Fetch the direct dependencies of `name`.
    ///
    /// A package without dependencies, including one the provider has never
    /// heard of, yields an empty entry rather than an error. The batch may
    /// carry entries for other packages too.
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch>;
}

/// Source of installed versions and base-package classification
pub trait VersionProvider {
    /// Installed version of `name`, or `LookupFailure` when unknown
    fn version(&self, name: &str) -> RegistryResult<String>;

    /// Whether `name` ships with the runtime and must be left out of the order
    fn is_base_package(&self, name: &str) -> bool;
}

/// A registry answering both dependency and version queries
pub trait PackageRegistry: DependencyProvider + VersionProvider {}

impl<T: DependencyProvider + VersionProvider + ?Sized> PackageRegistry for T {}

impl<T: DependencyProvider + ?Sized> DependencyProvider for &T {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        (**self).direct_dependencies(name)
    }
}

impl<T: DependencyProvider + ?Sized> DependencyProvider for Box<T> {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        (**self).direct_dependencies(name)
    }
}

impl<T: VersionProvider + ?Sized> VersionProvider for &T {
    fn version(&self, name: &str) -> RegistryResult<String> {
        (**self).version(name)
    }

    fn is_base_package(&self, name: &str) -> bool {
        (**self).is_base_package(name)
    }
}

impl<T: VersionProvider + ?Sized> VersionProvider for Box<T> {
    fn version(&self, name: &str) -> RegistryResult<String> {
        (**self).version(name)
    }

    fn is_base_package(&self, name: &str) -> bool {
        (**self).is_base_package(name)
    }
}
