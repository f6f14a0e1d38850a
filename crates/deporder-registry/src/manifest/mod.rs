//! Offline registry read from a manifest file
//!
//! A manifest lists every known package with its version, direct
//! dependencies and whether it ships with the runtime:
//!
//! ```toml
//! [packages.app]
//! version = "1.0.0"
//! depends = ["ggplot2", "stats"]
//!
//! [packages.stats]
//! version = "4.3.2"
//! base = true
//! ```
//!
//! The same structure is accepted as JSON.

use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use deporder_core::{DeporderError, DependencyBatch};

use crate::provider::{DependencyProvider, VersionProvider};
use crate::RegistryResult;

/// One package in a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Installed version; lookups fail when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Direct dependencies in declaration order
    #[serde(default)]
    pub depends: Vec<String>,

    /// Whether the package is part of the base distribution
    #[serde(default)]
    pub base: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    packages: IndexMap<String, ManifestEntry>,
}

/// Registry answering from an in-memory package table
#[derive(Debug, Clone, Default)]
pub struct ManifestRegistry {
    packages: IndexMap<String, ManifestEntry>,
}

impl ManifestRegistry {
    /// Create a registry from already parsed entries
    pub fn from_entries(packages: IndexMap<String, ManifestEntry>) -> Self {
        Self { packages }
    }

    /// Parse a TOML manifest
    pub fn from_toml_str(content: &str) -> RegistryResult<Self> {
        let file: ManifestFile = toml::from_str(content).map_err(|e| DeporderError::TomlParse {
            message: format!("invalid registry manifest: {}", e),
        })?;
        Self::validated(file)
    }

    /// Parse a JSON manifest
    pub fn from_json_str(content: &str) -> RegistryResult<Self> {
        let file: ManifestFile =
            serde_json::from_str(content).map_err(|e| DeporderError::JsonParse {
                message: format!("invalid registry manifest: {}", e),
            })?;
        Self::validated(file)
    }

    /// Load a manifest file, picking the format from its extension
    pub fn load(path: &Utf8Path) -> RegistryResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeporderError::io(format!("Failed to read {}", path), e))?;

        let registry = match path.extension() {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
        .map_err(|e| match e {
            DeporderError::TomlParse { message } => DeporderError::TomlParse {
                message: format!("In file {}: {}", path, message),
            },
            DeporderError::JsonParse { message } => DeporderError::JsonParse {
                message: format!("In file {}: {}", path, message),
            },
            other => other,
        })?;

        debug!("Loaded {} packages from {}", registry.len(), path);
        Ok(registry)
    }

    fn validated(file: ManifestFile) -> RegistryResult<Self> {
        if let Some(name) = file.packages.keys().find(|name| name.trim().is_empty()) {
            return Err(DeporderError::ConfigValidation {
                field: format!("packages.{:?}", name),
                reason: "package names must not be empty".to_string(),
            });
        }
        Ok(Self::from_entries(file.packages))
    }

    /// Number of packages in the manifest
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Look up a manifest entry
    pub fn get(&self, name: &str) -> Option<&ManifestEntry> {
        self.packages.get(name)
    }
}

impl DependencyProvider for ManifestRegistry {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        let depends = self
            .packages
            .get(name)
            .map(|entry| entry.depends.clone())
            .unwrap_or_default();

        let mut batch = DependencyBatch::new();
        batch.insert(name.to_string(), depends);
        Ok(batch)
    }
}

impl VersionProvider for ManifestRegistry {
    fn version(&self, name: &str) -> RegistryResult<String> {
        match self.packages.get(name) {
            Some(ManifestEntry {
                version: Some(version),
                ..
            }) => Ok(version.clone()),
            Some(_) => Err(DeporderError::lookup(name, "manifest entry has no version")),
            None => Err(DeporderError::lookup(name, "not listed in manifest")),
        }
    }

    fn is_base_package(&self, name: &str) -> bool {
        self.packages.get(name).is_some_and(|entry| entry.base)
    }
}
