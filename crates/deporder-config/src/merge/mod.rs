//! Configuration layering, discovery, and environment overrides

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use deporder_core::error::DeporderError;

use crate::toml::{self, DeporderToml, ProviderKind};
use crate::ConfigResult;

/// Project configuration file name
pub const PROJECT_FILE: &str = "deporder.toml";

/// Prefix of environment variables that override configuration
pub const ENV_PREFIX: &str = "DEPORDER_";

/// Environment variables the loader applies; other `DEPORDER_*` names are ignored
pub const ENV_KEYS: [&str; 5] = [
    "DEPORDER_CACHE_TTL",
    "DEPORDER_MANIFEST",
    "DEPORDER_PROVIDER",
    "DEPORDER_REPOS",
    "DEPORDER_RSCRIPT",
];

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
    /// Global config file, `~/.deporder/config.toml` unless overridden
    global_path: Option<Utf8PathBuf>,
    /// File given with `--config`; replaces project discovery
    explicit: Option<Utf8PathBuf>,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Built-in defaults
    Defaults,
    /// Global config file
    Global(Utf8PathBuf),
    /// Project deporder.toml file
    Project(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Fully layered configuration and where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DeporderToml,
    pub sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self {
            cwd,
            global_path: default_global_path(),
            explicit: None,
        }
    }

    /// Use a different global config file, or none at all
    pub fn with_global_path(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.global_path = path;
        self
    }

    /// Load the project layer from `path` instead of searching for it
    pub fn with_explicit(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.is_file())
    }

    /// Load the project layer, if any
    pub fn load_project_config(&self) -> ConfigResult<Option<(DeporderToml, Utf8PathBuf)>> {
        let path = match &self.explicit {
            Some(explicit) => {
                let path = if explicit.is_absolute() {
                    explicit.clone()
                } else {
                    self.cwd.join(explicit)
                };
                if !path.is_file() {
                    return Err(DeporderError::ConfigValidation {
                        field: "config".to_string(),
                        reason: format!("config file {} does not exist", path),
                    });
                }
                path
            }
            None => match self.resolve_config_path(PROJECT_FILE) {
                Some(path) => path,
                None => return Ok(None),
            },
        };

        let config = load_relative_to(&path)?;
        Ok(Some((config, path)))
    }

    /// Load the global layer, if the file exists
    pub fn load_global_config(&self) -> ConfigResult<Option<(DeporderToml, Utf8PathBuf)>> {
        match &self.global_path {
            Some(path) if path.is_file() => Ok(Some((load_relative_to(path)?, path.clone()))),
            _ => Ok(None),
        }
    }

    /// Load every layer and merge them.
    ///
    /// Later layers win: defaults, global file, project file, environment,
    /// then command-line overrides.
    pub fn load(
        &self,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<LoadedConfig> {
        let mut sources = vec![ConfigSource::Defaults];

        let global = self.load_global_config()?.map(|(config, path)| {
            sources.push(ConfigSource::Global(path));
            config
        });
        let project = self.load_project_config()?.map(|(config, path)| {
            sources.push(ConfigSource::Project(path));
            config
        });

        sources.extend(
            ENV_KEYS
                .iter()
                .filter(|key| env_overrides.contains_key(**key))
                .map(|key| ConfigSource::Environment(key.to_string())),
        );
        if !cli_overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }

        let config = ConfigLayering::merge_configs(
            global,
            project,
            &env_overrides,
            &cli_overrides,
            &self.cwd,
        )?;
        debug!("Configuration layered from {:?}", sources);

        Ok(LoadedConfig { config, sources })
    }
}

impl ConfigLayering {
    /// Merge multiple configuration layers.
    ///
    /// A project file replaces the global one section by section, except
    /// `resolve.extra_base`, which accumulates across both files.
    pub fn merge_configs(
        global_config: Option<DeporderToml>,
        project_config: Option<DeporderToml>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &HashMap<String, String>,
        cwd: &Utf8Path,
    ) -> ConfigResult<DeporderToml> {
        let mut merged = match (global_config, project_config) {
            (Some(global), Some(mut project)) => {
                for name in global.resolve.extra_base {
                    if !project.resolve.extra_base.contains(&name) {
                        project.resolve.extra_base.push(name);
                    }
                }
                project
            }
            (Some(global), None) => global,
            (None, Some(project)) => project,
            (None, None) => DeporderToml::default(),
        };

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, env_overrides, cwd)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, cli_overrides, cwd)?;

        toml::validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut DeporderToml,
        overrides: &HashMap<String, String>,
        cwd: &Utf8Path,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "DEPORDER_PROVIDER" => {
                    config.registry.provider = value.parse()?;
                }
                "DEPORDER_MANIFEST" => {
                    config.registry.manifest = Some(absolutize(cwd, value));
                }
                "DEPORDER_RSCRIPT" => {
                    config.rscript.program = value.clone();
                }
                "DEPORDER_REPOS" => {
                    config.rscript.repos = Some(value.clone());
                }
                "DEPORDER_CACHE_TTL" => {
                    config.cache.ttl_secs =
                        value.parse().map_err(|e| DeporderError::ConfigValidation {
                            field: "DEPORDER_CACHE_TTL".to_string(),
                            reason: format!("Invalid number of seconds: {}", e),
                        })?;
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        config: &mut DeporderToml,
        overrides: &HashMap<String, String>,
        cwd: &Utf8Path,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "registry" => {
                    config.registry.provider = ProviderKind::Manifest;
                    config.registry.manifest = Some(absolutize(cwd, value));
                }
                "no_cache" => {
                    config.cache.enabled = false;
                }
                _ => {
                    // Unknown CLI override, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn default_global_path() -> Option<Utf8PathBuf> {
    let home = Utf8PathBuf::from_path_buf(dirs::home_dir()?).ok()?;
    Some(home.join(".deporder").join("config.toml"))
}

/// Load a config file, resolving its relative paths against its directory
fn load_relative_to(path: &Utf8Path) -> ConfigResult<DeporderToml> {
    let mut config = toml::load_from_file(path)?;
    let base = path.parent().unwrap_or(Utf8Path::new("."));

    if let Some(manifest) = config.registry.manifest.take() {
        config.registry.manifest = Some(absolutize(base, manifest.as_str()));
    }
    if let Some(cache) = config.cache.path.take() {
        config.cache.path = Some(absolutize(base, cache.as_str()));
    }

    Ok(config)
}

fn absolutize(base: &Utf8Path, value: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn isolated_loader(cwd: Utf8PathBuf) -> ConfigLoader {
        ConfigLoader::new(cwd).with_global_path(None)
    }

    #[test]
    fn test_resolve_config_path_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_path(&temp_dir);
        std::fs::write(root.join(PROJECT_FILE), "").unwrap();
        let nested = root.join("analysis").join("scripts");
        std::fs::create_dir_all(&nested).unwrap();

        let loader = isolated_loader(nested);
        assert_eq!(loader.resolve_config_path(PROJECT_FILE), Some(root.join(PROJECT_FILE)));
        assert_eq!(loader.resolve_config_path("missing.toml"), None);
    }

    #[test]
    fn test_load_without_any_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = isolated_loader(temp_path(&temp_dir))
            .load(HashMap::new(), HashMap::new())
            .unwrap();

        assert_eq!(loaded.config, DeporderToml::default());
        assert_eq!(loaded.sources, vec![ConfigSource::Defaults]);
    }

    #[test]
    fn test_manifest_path_is_relative_to_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_path(&temp_dir);
        std::fs::write(
            root.join(PROJECT_FILE),
            "[registry]\nprovider = \"manifest\"\nmanifest = \"deps/registry.toml\"\n",
        )
        .unwrap();
        let nested = root.join("sub");
        std::fs::create_dir_all(&nested).unwrap();

        let loaded = isolated_loader(nested).load(HashMap::new(), HashMap::new()).unwrap();
        assert_eq!(
            loaded.config.registry.manifest,
            Some(root.join("deps").join("registry.toml"))
        );
        assert!(matches!(loaded.sources[1], ConfigSource::Project(_)));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let loader = isolated_loader(temp_path(&temp_dir))
            .with_explicit(Some(Utf8PathBuf::from("nope.toml")));

        let err = loader.load(HashMap::new(), HashMap::new()).unwrap_err();
        assert!(matches!(err, DeporderError::ConfigValidation { .. }));
    }

    #[test]
    fn test_global_and_project_layers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_path(&temp_dir);
        let global = root.join("global.toml");
        std::fs::write(
            &global,
            "[rscript]\nrepos = \"https://global.example\"\n\n[resolve]\nextra_base = [\"Matrix\"]\n",
        )
        .unwrap();
        std::fs::write(
            root.join(PROJECT_FILE),
            "[resolve]\nextra_base = [\"Rcpp\"]\n",
        )
        .unwrap();

        let loaded = ConfigLoader::new(root.clone())
            .with_global_path(Some(global.clone()))
            .load(HashMap::new(), HashMap::new())
            .unwrap();

        // Project sections replace global ones
        assert_eq!(loaded.config.rscript.repos, None);
        // Extra base packages accumulate
        assert_eq!(loaded.config.resolve.extra_base, vec!["Rcpp", "Matrix"]);
        assert_eq!(
            loaded.sources,
            vec![
                ConfigSource::Defaults,
                ConfigSource::Global(global),
                ConfigSource::Project(root.join(PROJECT_FILE)),
            ]
        );
    }

    #[test]
    fn test_only_applied_env_keys_are_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let env_overrides = HashMap::from([
            ("DEPORDER_RSCRIPT".to_string(), "/opt/R/bin/Rscript".to_string()),
            ("DEPORDER_TEST_COLLECT".to_string(), "1".to_string()),
            ("DEPORDER_LOG".to_string(), "debug".to_string()),
        ]);

        let loaded = isolated_loader(temp_path(&temp_dir))
            .load(env_overrides, HashMap::new())
            .unwrap();

        assert_eq!(loaded.config.rscript.program, "/opt/R/bin/Rscript");
        assert_eq!(
            loaded.sources,
            vec![
                ConfigSource::Defaults,
                ConfigSource::Environment("DEPORDER_RSCRIPT".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_configs() {
        let project = toml::parse_deporder_toml("[cache]\nttl_secs = 10\n").unwrap();

        let env_overrides = HashMap::from([
            ("DEPORDER_RSCRIPT".to_string(), "/opt/R/bin/Rscript".to_string()),
            ("DEPORDER_CACHE_TTL".to_string(), "120".to_string()),
        ]);
        let cli_overrides = HashMap::from([
            ("registry".to_string(), "registry.json".to_string()),
            ("no_cache".to_string(), "true".to_string()),
        ]);

        let merged = ConfigLayering::merge_configs(
            None,
            Some(project),
            &env_overrides,
            &cli_overrides,
            Utf8Path::new("/work"),
        )
        .unwrap();

        // Environment override should be applied
        assert_eq!(merged.rscript.program, "/opt/R/bin/Rscript");
        assert_eq!(merged.cache.ttl_secs, 120);

        // CLI override should be applied (highest priority)
        assert_eq!(merged.registry.provider, ProviderKind::Manifest);
        assert_eq!(
            merged.registry.manifest,
            Some(Utf8PathBuf::from("/work/registry.json"))
        );
        assert!(!merged.cache.enabled);
    }

    #[test]
    fn test_invalid_env_override() {
        let env_overrides = HashMap::from([("DEPORDER_CACHE_TTL".to_string(), "soon".to_string())]);
        let err = ConfigLayering::merge_configs(
            None,
            None,
            &env_overrides,
            &HashMap::new(),
            Utf8Path::new("/work"),
        )
        .unwrap_err();
        assert!(matches!(err, DeporderError::ConfigValidation { ref field, .. } if field == "DEPORDER_CACHE_TTL"));
    }

    #[test]
    fn test_manifest_provider_from_env_needs_path() {
        let env_overrides = HashMap::from([("DEPORDER_PROVIDER".to_string(), "manifest".to_string())]);
        let result = ConfigLayering::merge_configs(
            None,
            None,
            &env_overrides,
            &HashMap::new(),
            Utf8Path::new("/work"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_env_overrides() {
        std::env::set_var("DEPORDER_TEST_COLLECT", "1");
        std::env::set_var("NOT_DEPORDER_TEST_COLLECT", "ignored");

        let overrides = ConfigLayering::collect_env_overrides();

        assert!(overrides.contains_key("DEPORDER_TEST_COLLECT"));
        assert!(!overrides.contains_key("NOT_DEPORDER_TEST_COLLECT"));

        std::env::remove_var("DEPORDER_TEST_COLLECT");
        std::env::remove_var("NOT_DEPORDER_TEST_COLLECT");
    }
}
