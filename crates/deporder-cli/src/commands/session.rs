//! Registry construction from configuration

use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::{debug, warn};

use deporder_config::{DeporderToml, ProviderKind, RscriptSection};
use deporder_core::error::{DeporderError, DeporderResult};
use deporder_registry::{
    CachedProvider, ManifestRegistry, PackageRegistry, RscriptConfig, RuntimeRegistry,
};

/// The configured registry behind a lookup cache
pub type SessionRegistry = CachedProvider<Box<dyn PackageRegistry>>;

/// A registry opened for one command, with its cache file if any
pub struct RegistrySession {
    registry: SessionRegistry,
    cache_file: Option<Utf8PathBuf>,
    fingerprint: String,
}

impl RegistrySession {
    /// Open the registry selected by `config`.
    ///
    /// Only R runtime lookups are persisted between runs; a manifest is
    /// cheap to re-read and its answers must follow edits to the file.
    /// Persisted lookups are tagged with the runtime settings that produced
    /// them and reused only under the same settings.
    pub fn open(config: &DeporderToml) -> DeporderResult<Self> {
        let mut fingerprint = String::new();
        let provider: Box<dyn PackageRegistry> = match config.registry.provider {
            ProviderKind::Manifest => {
                let path = config.registry.manifest.as_ref().ok_or_else(|| {
                    DeporderError::ConfigValidation {
                        field: "registry.manifest".to_string(),
                        reason: "a manifest path is required when provider = \"manifest\""
                            .to_string(),
                    }
                })?;
                Box::new(ManifestRegistry::load(path)?)
            }
            ProviderKind::Rscript => {
                let rscript = rscript_config(&config.rscript);
                fingerprint = rscript.fingerprint();
                Box::new(RuntimeRegistry::connect(rscript)?)
            }
        };

        let registry =
            CachedProvider::with_ttl(provider, Duration::from_secs(config.cache.ttl_secs));

        let cache_file = if config.cache.enabled && config.registry.provider == ProviderKind::Rscript
        {
            config.cache.file()
        } else {
            None
        };

        if let Some(path) = &cache_file {
            let loaded = registry.load(path, &fingerprint)?;
            debug!("Reusing {} cached dependency lookups", loaded);
        }

        Ok(Self {
            registry,
            cache_file,
            fingerprint,
        })
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Persist the lookup cache. Failures are logged, never fatal.
    pub fn close(self) {
        let stats = self.registry.stats();
        debug!(
            "Dependency cache: {} hits, {} misses, {} entries",
            stats.hits, stats.misses, stats.total_entries
        );

        if let Some(path) = &self.cache_file {
            if let Err(err) = self.registry.persist(path, &self.fingerprint) {
                warn!("Could not write dependency cache {}: {}", path, err);
            }
        }
    }
}

/// Runtime settings from the `[rscript]` section
pub fn rscript_config(section: &RscriptSection) -> RscriptConfig {
    RscriptConfig {
        program: section.program.clone(),
        repos: section.repos.clone(),
        which: section.which.clone(),
    }
}
