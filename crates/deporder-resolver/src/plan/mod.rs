//! Install plans: ordered, base-filtered, version-annotated
//!
//! Composes graph construction and sorting, drops every package the version
//! provider (or the configuration) classifies as base, and attaches a
//! version to what remains.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use deporder_core::{PackageName, VersionRecord};
use deporder_registry::{DependencyProvider, PackageRegistry, VersionProvider};

use crate::graph::{DependencyGraph, GraphBuilder};
use crate::order::topological_sort;
use crate::ResolverResult;

/// Result of planning the installation of one root package
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    /// Package the plan was computed for
    pub root: PackageName,
    /// Non-base packages in installation order
    pub entries: Vec<VersionRecord>,
    /// Base packages removed from the order, in the order they were seen
    pub skipped_base: Vec<PackageName>,
    /// Full resolved dependency graph
    #[serde(skip)]
    pub graph: DependencyGraph,
}

impl InstallPlan {
    /// Package names in installation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|record| record.name.as_str())
    }

    /// Number of packages whose version could not be resolved
    pub fn unknown_versions(&self) -> usize {
        self.entries
            .iter()
            .filter(|record| !record.version.is_known())
            .count()
    }
}

/// Produces install plans from a dependency and a version provider
pub struct InstallPlanner<'a, D: ?Sized, V: ?Sized> {
    dependencies: &'a D,
    versions: &'a V,
    extra_base: HashSet<PackageName>,
}

impl<'a, R: PackageRegistry + ?Sized> InstallPlanner<'a, R, R> {
    /// Planner using one registry for both kinds of queries
    pub fn for_registry(registry: &'a R) -> Self {
        Self::new(registry, registry)
    }
}

impl<'a, D, V> InstallPlanner<'a, D, V>
where
    D: DependencyProvider + ?Sized,
    V: VersionProvider + ?Sized,
{
    /// Create a planner from separate providers
    pub fn new(dependencies: &'a D, versions: &'a V) -> Self {
        Self {
            dependencies,
            versions,
            extra_base: HashSet::new(),
        }
    }

    /// Treat these packages as base in addition to the provider's classification
    pub fn with_extra_base<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = PackageName>,
    {
        self.extra_base.extend(names);
        self
    }

    /// Whether `name` is excluded from plans
    pub fn is_base(&self, name: &str) -> bool {
        self.extra_base.contains(name) || self.versions.is_base_package(name)
    }

    /// Compute the install plan for `root`.
    ///
    /// A cycle aborts planning. A version lookup failure only marks that
    /// package's version as unknown; other provider errors abort.
    pub fn plan(&self, root: &str) -> ResolverResult<InstallPlan> {
        let graph = GraphBuilder::new(self.dependencies).build(root)?;
        let order = topological_sort(&graph)?;

        let mut entries = Vec::with_capacity(order.len());
        let mut skipped_base = Vec::new();

        for name in order {
            if self.is_base(&name) {
                info!("Skipping base package {}", name);
                skipped_base.push(name);
                continue;
            }

            let record = match self.versions.version(&name) {
                Ok(version) => VersionRecord::known(name, version),
                Err(err) if err.is_recoverable() => {
                    warn!("No version for {}: {}", name, err);
                    VersionRecord::unknown(name, err.to_string())
                }
                Err(err) => return Err(err),
            };
            entries.push(record);
        }

        Ok(InstallPlan {
            root: root.to_string(),
            entries,
            skipped_base,
            graph,
        })
    }
}
