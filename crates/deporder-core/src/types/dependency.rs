//! Dependency answers and the DESCRIPTION fields they come from.
//!
//! Defines the batch a provider hands back for one lookup and the kinds of
//! dependency fields a provider may be asked to follow.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::PackageName;

/// Direct dependencies returned by a single provider call.
///
/// A batch covers at least the requested package, but a provider is free to
/// answer for several packages at once. Entry order is the provider's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyBatch {
    entries: IndexMap<PackageName, Vec<PackageName>>,
}

impl DependencyBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a batch holding a single package with no dependencies
    pub fn leaf(name: impl Into<PackageName>) -> Self {
        let mut batch = Self::new();
        batch.insert(name.into(), Vec::new());
        batch
    }

    /// Record the direct dependencies of a package, replacing any earlier entry
    pub fn insert(&mut self, name: PackageName, dependencies: Vec<PackageName>) {
        self.entries.insert(name, dependencies);
    }

    /// Get the direct dependencies listed for a package
    pub fn get(&self, name: &str) -> Option<&[PackageName]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Check whether the batch has an entry for a package
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of packages covered by this batch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in provider order
    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Vec<PackageName>)> {
        self.entries.iter()
    }
}

impl IntoIterator for DependencyBatch {
    type Item = (PackageName, Vec<PackageName>);
    type IntoIter = indexmap::map::IntoIter<PackageName, Vec<PackageName>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(PackageName, Vec<PackageName>)> for DependencyBatch {
    fn from_iter<T: IntoIterator<Item = (PackageName, Vec<PackageName>)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Which DESCRIPTION fields count as dependency edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Packages attached before this one is loaded
    Depends,
    /// Packages whose namespaces are imported
    Imports,
    /// Packages whose headers are needed to compile
    LinkingTo,
    /// Packages used only in examples, tests or vignettes
    Suggests,
    /// Packages this one enhances
    Enhances,
}

impl DependencyKind {
    /// Kinds followed when nothing else is configured
    pub const DEFAULT: [DependencyKind; 3] = [
        DependencyKind::Depends,
        DependencyKind::Imports,
        DependencyKind::LinkingTo,
    ];

    /// Field name as it appears in a DESCRIPTION file
    pub fn field_name(&self) -> &'static str {
        match self {
            DependencyKind::Depends => "Depends",
            DependencyKind::Imports => "Imports",
            DependencyKind::LinkingTo => "LinkingTo",
            DependencyKind::Suggests => "Suggests",
            DependencyKind::Enhances => "Enhances",
        }
    }

    /// Check if this dependency is needed to install the package
    pub fn is_install_time(&self) -> bool {
        matches!(
            self,
            DependencyKind::Depends | DependencyKind::Imports | DependencyKind::LinkingTo
        )
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Depends" => Ok(DependencyKind::Depends),
            "Imports" => Ok(DependencyKind::Imports),
            "LinkingTo" => Ok(DependencyKind::LinkingTo),
            "Suggests" => Ok(DependencyKind::Suggests),
            "Enhances" => Ok(DependencyKind::Enhances),
            other => Err(format!("unknown dependency kind '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_batch() {
        let batch = DependencyBatch::leaf("jsonlite");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get("jsonlite"), Some(&[][..]));
        assert!(batch.get("Rcpp").is_none());
    }

    #[test]
    fn test_batch_keeps_provider_order() {
        let batch: DependencyBatch = vec![
            ("zoo".to_string(), vec!["lattice".to_string()]),
            ("abind".to_string(), Vec::new()),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = batch.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["zoo", "abind"]);
    }

    #[test]
    fn test_batch_serializes_as_plain_map() {
        let mut batch = DependencyBatch::new();
        batch.insert("a".to_string(), vec!["b".to_string()]);
        let json = serde_json::to_string(&batch).unwrap();
        assert_eq!(json, r#"{"a":["b"]}"#);
    }

    #[test]
    fn test_dependency_kinds() {
        assert_eq!(DependencyKind::DEFAULT.len(), 3);
        assert!(DependencyKind::LinkingTo.is_install_time());
        assert!(!DependencyKind::Suggests.is_install_time());
        assert_eq!("Imports".parse::<DependencyKind>(), Ok(DependencyKind::Imports));
        assert!("imports".parse::<DependencyKind>().is_err());
        assert_eq!(DependencyKind::Enhances.to_string(), "Enhances");
    }
}
