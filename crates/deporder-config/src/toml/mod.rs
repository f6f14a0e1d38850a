//! deporder.toml configuration parsing and validation

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use deporder_core::error::DeporderError;
use deporder_core::utils::is_valid_package_name;
use deporder_core::DependencyKind;

use crate::ConfigResult;

/// Complete deporder.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeporderToml {
    /// Which provider answers queries
    pub registry: RegistrySection,

    /// R runtime settings
    pub rscript: RscriptSection,

    /// Resolution settings
    pub resolve: ResolveSection,

    /// Dependency lookup cache
    pub cache: CacheSection,

    /// Installed-package inventory
    pub snapshot: SnapshotSection,
}

/// Provider selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Query the local R installation
    #[default]
    Rscript,
    /// Read a manifest file
    Manifest,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Rscript => f.write_str("rscript"),
            ProviderKind::Manifest => f.write_str("manifest"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = DeporderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rscript" => Ok(ProviderKind::Rscript),
            "manifest" => Ok(ProviderKind::Manifest),
            other => Err(DeporderError::ConfigValidation {
                field: "registry.provider".to_string(),
                reason: format!("unknown provider '{}', expected 'rscript' or 'manifest'", other),
            }),
        }
    }
}

/// `[registry]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    pub provider: ProviderKind,

    /// Manifest file, required when `provider = "manifest"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<Utf8PathBuf>,
}

/// `[rscript]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RscriptSection {
    /// Program used to evaluate R expressions
    pub program: String,

    /// CRAN mirror URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<String>,

    /// DESCRIPTION fields followed as dependencies
    pub which: Vec<DependencyKind>,
}

impl Default for RscriptSection {
    fn default() -> Self {
        Self {
            program: "Rscript".to_string(),
            repos: None,
            which: DependencyKind::DEFAULT.to_vec(),
        }
    }
}

/// `[resolve]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveSection {
    /// Packages treated as base on top of the provider's own classification
    pub extra_base: Vec<String>,
}

/// `[cache]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub enabled: bool,

    /// Seconds a cached dependency lookup stays valid
    pub ttl_secs: u64,

    /// Cache file; defaults to the platform cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            path: None,
        }
    }
}

impl CacheSection {
    /// Configured cache file or `<cache dir>/deporder/dependencies.json`
    pub fn file(&self) -> Option<Utf8PathBuf> {
        self.path.clone().or_else(|| {
            let dir = Utf8PathBuf::from_path_buf(dirs::cache_dir()?).ok()?;
            Some(dir.join("deporder").join("dependencies.json"))
        })
    }
}

/// `[snapshot]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotSection {
    /// Python interpreter whose packages are listed
    pub python: String,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
        }
    }
}

/// Parse TOML string to a validated configuration
pub fn parse_deporder_toml(content: &str) -> ConfigResult<DeporderToml> {
    let config: DeporderToml = toml::from_str(content).map_err(|e| DeporderError::TomlParse {
        message: format!("TOML parsing error: {}", e),
    })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize a configuration back to TOML
pub fn serialize_deporder_toml(config: &DeporderToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| DeporderError::TomlParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &DeporderToml) -> ConfigResult<()> {
    if config.registry.provider == ProviderKind::Manifest && config.registry.manifest.is_none() {
        return Err(DeporderError::ConfigValidation {
            field: "registry.manifest".to_string(),
            reason: "a manifest path is required when provider = \"manifest\"".to_string(),
        });
    }

    if config.rscript.program.trim().is_empty() {
        return Err(DeporderError::ConfigValidation {
            field: "rscript.program".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if config.rscript.which.is_empty() {
        return Err(DeporderError::ConfigValidation {
            field: "rscript.which".to_string(),
            reason: "at least one dependency kind is required".to_string(),
        });
    }

    if let Some(name) = config
        .resolve
        .extra_base
        .iter()
        .find(|name| !is_valid_package_name(name))
    {
        return Err(DeporderError::ConfigValidation {
            field: "resolve.extra_base".to_string(),
            reason: format!("'{}' is not a valid package name", name),
        });
    }

    if config.snapshot.python.trim().is_empty() {
        return Err(DeporderError::ConfigValidation {
            field: "snapshot.python".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Load and parse deporder.toml from file path
pub fn load_from_file(path: &Utf8Path) -> ConfigResult<DeporderToml> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DeporderError::io(format!("Failed to read {}", path), e))?;

    parse_deporder_toml(&content).map_err(|e| in_file(path, e))
}

/// Prefix parse and validation errors with the file they came from
pub(crate) fn in_file(path: &Utf8Path, error: DeporderError) -> DeporderError {
    match error {
        DeporderError::TomlParse { message } => DeporderError::TomlParse {
            message: format!("In file {}: {}", path, message),
        },
        DeporderError::ConfigValidation { field, reason } => DeporderError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_deporder_toml("").unwrap();
        assert_eq!(config, DeporderToml::default());
        assert_eq!(config.registry.provider, ProviderKind::Rscript);
        assert_eq!(config.rscript.program, "Rscript");
        assert_eq!(config.rscript.which, DependencyKind::DEFAULT.to_vec());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.snapshot.python, "python3");
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[registry]
provider = "manifest"
manifest = "registry.toml"

[rscript]
program = "/opt/R/4.3.2/bin/Rscript"
repos = "https://cloud.r-project.org"
which = ["Depends", "Imports"]

[resolve]
extra_base = ["Rcpp"]

[cache]
enabled = false
ttl_secs = 60
"#;
        let config = parse_deporder_toml(toml).unwrap();
        assert_eq!(config.registry.provider, ProviderKind::Manifest);
        assert_eq!(config.registry.manifest.as_deref(), Some(Utf8Path::new("registry.toml")));
        assert_eq!(config.rscript.repos.as_deref(), Some("https://cloud.r-project.org"));
        assert_eq!(
            config.rscript.which,
            vec![DependencyKind::Depends, DependencyKind::Imports]
        );
        assert_eq!(config.resolve.extra_base, vec!["Rcpp"]);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_manifest_provider_requires_path() {
        let err = parse_deporder_toml("[registry]\nprovider = \"manifest\"").unwrap_err();
        assert!(matches!(err, DeporderError::ConfigValidation { ref field, .. } if field == "registry.manifest"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_deporder_toml("[registry]\nprovider = \"cran\"").is_err());
        assert!(parse_deporder_toml("[rscript]\nwhich = []").is_err());
        assert!(parse_deporder_toml("[rscript]\nwhich = [\"Requires\"]").is_err());
        assert!(parse_deporder_toml("[resolve]\nextra_base = [\"not valid\"]").is_err());
        assert!(parse_deporder_toml("[unknown]\nkey = 1").is_err());
    }

    #[test]
    fn test_round_trip_serialization() {
        let toml = r#"
[rscript]
repos = "https://cloud.r-project.org"

[resolve]
extra_base = ["Matrix"]
"#;
        let config = parse_deporder_toml(toml).unwrap();
        let serialized = serialize_deporder_toml(&config).unwrap();
        let reparsed = parse_deporder_toml(&serialized).unwrap();

        assert_eq!(config, reparsed);
    }

    #[test]
    fn test_provider_kind_from_str() {
        assert_eq!("manifest".parse::<ProviderKind>().unwrap(), ProviderKind::Manifest);
        assert_eq!(ProviderKind::Rscript.to_string(), "rscript");
        assert!("Manifest".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_explicit_cache_file() {
        let cache = CacheSection {
            path: Some(Utf8PathBuf::from("/tmp/deps.json")),
            ..CacheSection::default()
        };
        assert_eq!(cache.file(), Some(Utf8PathBuf::from("/tmp/deps.json")));
    }
}
