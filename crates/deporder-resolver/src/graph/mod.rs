//! Dependency graph and its breadth-first construction
//!
//! The graph is an insertion-ordered adjacency map from a package to the
//! packages it directly depends on. Key order is the order in which packages
//! were discovered, which keeps the later sort reproducible.

use std::collections::VecDeque;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use deporder_core::{DependencyBatch, PackageName};
use deporder_registry::DependencyProvider;

use crate::ResolverResult;

/// Adjacency mapping from a package to its direct dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    adjacency: IndexMap<PackageName, Vec<PackageName>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a package's dependencies unless it already has an entry.
    ///
    /// Returns `true` when the entry was added.
    pub fn insert(&mut self, name: PackageName, dependencies: Vec<PackageName>) -> bool {
        match self.adjacency.entry(name) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(dependencies);
                true
            }
        }
    }

    /// Merge every entry of a provider batch, returning the names that were new
    pub fn merge(&mut self, batch: DependencyBatch) -> Vec<PackageName> {
        let mut added = Vec::new();
        for (name, dependencies) in batch {
            if self.insert(name.clone(), dependencies) {
                added.push(name);
            }
        }
        added
    }

    /// Check whether a package has an entry
    pub fn contains(&self, name: &str) -> bool {
        self.adjacency.contains_key(name)
    }

    /// Direct dependencies of a package, if it has an entry
    pub fn dependencies_of(&self, name: &str) -> Option<&[PackageName]> {
        self.adjacency.get(name).map(Vec::as_slice)
    }

    /// Packages with an entry, in discovery order
    pub fn packages(&self) -> impl Iterator<Item = &PackageName> {
        self.adjacency.keys()
    }

    /// Entries in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Vec<PackageName>)> {
        self.adjacency.iter()
    }

    /// Get number of packages in the graph
    pub fn package_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Get number of dependency edges in the graph
    pub fn dependency_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Dependency names that have no entry of their own
    pub fn dangling(&self) -> Vec<&PackageName> {
        let mut dangling: Vec<&PackageName> = Vec::new();
        for dep in self.adjacency.values().flatten() {
            if !self.contains(dep) && !dangling.contains(&dep) {
                dangling.push(dep);
            }
        }
        dangling
    }
}

impl FromIterator<(PackageName, Vec<PackageName>)> for DependencyGraph {
    fn from_iter<T: IntoIterator<Item = (PackageName, Vec<PackageName>)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (name, dependencies) in iter {
            graph.insert(name, dependencies);
        }
        graph
    }
}

impl<'a> FromIterator<(&'a str, &'a [&'a str])> for DependencyGraph {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a [&'a str])>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(name, deps)| {
                (
                    name.to_string(),
                    deps.iter().map(|dep| dep.to_string()).collect(),
                )
            })
            .collect()
    }
}

/// Breadth-first graph construction over a dependency provider
pub struct GraphBuilder<'a, P: ?Sized> {
    provider: &'a P,
}

impl<'a, P: DependencyProvider + ?Sized> GraphBuilder<'a, P> {
    /// Create a builder querying `provider`
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Resolve the full transitive dependency graph of `root`.
    ///
    /// Each package is fetched at most once. A lookup failure for a single
    /// package records it as a leaf; any other provider error aborts.
    pub fn build(&self, root: &str) -> ResolverResult<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let mut queue = VecDeque::from([root.to_string()]);
        let mut fetches = 0usize;

        while let Some(package) = queue.pop_front() {
            if graph.contains(&package) {
                continue;
            }

            fetches += 1;
            let batch = match self.provider.direct_dependencies(&package) {
                Ok(batch) => batch,
                Err(err) if err.is_recoverable() => {
                    warn!("Treating {} as a leaf: {}", package, err);
                    DependencyBatch::leaf(package.clone())
                }
                Err(err) => return Err(err),
            };
            debug!("Dependencies for {}: {:?}", package, batch);

            let mut added = graph.merge(batch);
            if !graph.contains(&package) {
                graph.insert(package.clone(), Vec::new());
                added.push(package.clone());
            }

            // The requested package's dependencies go first so discovery
            // order follows the provider's order for the package itself.
            if let Some(position) = added.iter().position(|name| *name == package) {
                added[..=position].rotate_right(1);
            }

            for name in &added {
                for dep in graph.dependencies_of(name).unwrap_or_default() {
                    if !graph.contains(dep) {
                        queue.push_back(dep.clone());
                    }
                }
            }
        }

        info!(
            "Resolved {} packages ({} edges) from {} with {} provider calls",
            graph.package_count(),
            graph.dependency_count(),
            root,
            fetches
        );

        Ok(graph)
    }
}

/// Resolve the full transitive dependency graph of `initial_package`
pub fn resolve_full_dependency_graph<P: DependencyProvider + ?Sized>(
    provider: &P,
    initial_package: &str,
) -> ResolverResult<DependencyGraph> {
    GraphBuilder::new(provider).build(initial_package)
}
