//! Dependency lookup caching with TTL support
//!
//! Spawning R for every package is slow, so dependency batches can be kept
//! in memory and persisted to a JSON file between runs. Version lookups and
//! base classification always go to the wrapped provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use camino::Utf8Path;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use deporder_core::{DeporderError, DependencyBatch, PackageName};

use crate::provider::{DependencyProvider, VersionProvider};
use crate::RegistryResult;

/// Default time-to-live for cached lookups
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry with TTL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached provider answer
    pub batch: DependencyBatch,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create new cache entry with default TTL (1 hour)
    pub fn new(batch: DependencyBatch) -> Self {
        Self::with_ttl(batch, DEFAULT_TTL)
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(batch: DependencyBatch, ttl: Duration) -> Self {
        Self {
            batch,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }

    /// Get age of cache entry
    pub fn age(&self) -> Option<Duration> {
        self.stored_at.elapsed().ok()
    }
}

/// Provider wrapper memoizing dependency lookups
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    entries: DashMap<PackageName, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups forwarded to the wrapped provider
    pub misses: u64,
}

impl<P> CachedProvider<P> {
    /// Wrap a provider with the default TTL
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    /// Wrap a provider with a custom TTL
    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Check if a package is cached and fresh
    pub fn contains_fresh(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let fresh_entries = self.entries.iter().filter(|entry| entry.is_fresh()).count();

        CacheStats {
            total_entries: self.entries.len(),
            fresh_entries,
            stale_entries: self.entries.len() - fresh_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove stale entries
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before - self.entries.len()
    }

    /// Load fresh entries from a cache file written by [`CachedProvider::persist`]
    ///
    /// Entries are only reused when the file was written under the same
    /// `fingerprint`; a file from another provider configuration is skipped.
    /// A missing file is not an error. A corrupt one is logged and ignored so a
    /// bad cache never blocks a resolution.
    pub fn load(&self, path: &Utf8Path, fingerprint: &str) -> RegistryResult<usize> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DeporderError::io(format!("Failed to read {}", path), e)),
        };

        let stored: CacheFile = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path, e);
                return Ok(0);
            }
        };

        if stored.fingerprint != fingerprint {
            debug!(
                "Ignoring cache file {} written for {} (now {})",
                path, stored.fingerprint, fingerprint
            );
            return Ok(0);
        }

        let mut loaded = 0;
        for (name, entry) in stored.entries.into_iter().filter(|(_, entry)| entry.is_fresh()) {
            self.entries.insert(name, entry);
            loaded += 1;
        }

        debug!("Loaded {} cached dependency lookups from {}", loaded, path);
        Ok(loaded)
    }

    /// Write all fresh entries to `path` under `fingerprint`, creating
    /// parent directories
    pub fn persist(&self, path: &Utf8Path, fingerprint: &str) -> RegistryResult<()> {
        let mut entries: Vec<(PackageName, CacheEntry)> = self
            .entries
            .iter()
            .filter(|entry| entry.is_fresh())
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DeporderError::io(format!("Failed to create {}", parent), e))?;
        }

        let file = CacheFile {
            fingerprint: fingerprint.to_string(),
            entries,
        };
        let json = serde_json::to_string(&file).map_err(|e| DeporderError::JsonParse {
            message: format!("Failed to serialize cache: {}", e),
        })?;
        std::fs::write(path, json)
            .map_err(|e| DeporderError::io(format!("Failed to write {}", path), e))
    }
}

/// On-disk layout of a persisted cache
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Provider configuration the entries were produced under
    fingerprint: String,
    entries: Vec<(PackageName, CacheEntry)>,
}

impl<P: DependencyProvider> DependencyProvider for CachedProvider<P> {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        if let Some(entry) = self.entries.get(name) {
            if entry.is_fresh() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.batch.clone());
            }
        }
        // Drop a stale entry before refetching
        self.entries.remove_if(name, |_, entry| !entry.is_fresh());

        self.misses.fetch_add(1, Ordering::Relaxed);
        let batch = self.inner.direct_dependencies(name)?;
        self.entries
            .insert(name.to_string(), CacheEntry::with_ttl(batch.clone(), self.ttl));
        Ok(batch)
    }
}

impl<P: VersionProvider> VersionProvider for CachedProvider<P> {
    fn version(&self, name: &str) -> RegistryResult<String> {
        self.inner.version(name)
    }

    fn is_base_package(&self, name: &str) -> bool {
        self.inner.is_base_package(name)
    }
}

#[cfg(test)]
mod tests;
