//! Unit tests for the dependency cache

use super::*;
use std::cell::Cell;

use camino::Utf8PathBuf;
use tempfile::TempDir;

/// Provider counting how often it is asked
struct CountingProvider {
    calls: Cell<usize>,
}

impl CountingProvider {
    fn new() -> Self {
        Self { calls: Cell::new(0) }
    }
}

impl DependencyProvider for CountingProvider {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        self.calls.set(self.calls.get() + 1);
        let mut batch = DependencyBatch::new();
        batch.insert(name.to_string(), vec![format!("{}dep", name)]);
        Ok(batch)
    }
}

impl VersionProvider for CountingProvider {
    fn version(&self, name: &str) -> RegistryResult<String> {
        Err(DeporderError::lookup(name, "no versions here"))
    }

    fn is_base_package(&self, name: &str) -> bool {
        name == "base"
    }
}

const FINGERPRINT: &str = "program=Rscript;repos=;which=Depends,Imports,LinkingTo";

fn cache_path(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("cache").join("dependencies.json")).unwrap()
}

#[test]
fn test_cache_entry_creation() {
    let entry = CacheEntry::new(DependencyBatch::leaf("a"));
    assert_eq!(entry.ttl, Duration::from_secs(3600)); // 1 hour default
    assert!(entry.is_fresh());
    assert!(entry.age().unwrap() < Duration::from_secs(5));
}

#[test]
fn test_zero_ttl_is_never_fresh() {
    let entry = CacheEntry::with_ttl(DependencyBatch::leaf("a"), Duration::ZERO);
    assert!(!entry.is_fresh());
}

#[test]
fn test_second_lookup_is_a_hit() {
    let cache = CachedProvider::new(CountingProvider::new());

    let first = cache.direct_dependencies("a").unwrap();
    let second = cache.direct_dependencies("a").unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.inner().calls.get(), 1);
    assert!(cache.contains_fresh("a"));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.fresh_entries, 1);
}

#[test]
fn test_stale_entries_are_refetched() {
    let cache = CachedProvider::with_ttl(CountingProvider::new(), Duration::ZERO);

    cache.direct_dependencies("a").unwrap();
    cache.direct_dependencies("a").unwrap();

    assert_eq!(cache.inner().calls.get(), 2);
    assert_eq!(cache.stats().stale_entries, 1);
    assert_eq!(cache.cleanup(), 1);
    assert_eq!(cache.stats().total_entries, 0);
}

#[test]
fn test_version_queries_pass_through() {
    let cache = CachedProvider::new(CountingProvider::new());
    assert!(cache.version("a").unwrap_err().is_recoverable());
    assert!(cache.is_base_package("base"));
    assert!(!cache.is_base_package("a"));
}

#[test]
fn test_persist_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);

    let cache = CachedProvider::new(CountingProvider::new());
    cache.direct_dependencies("a").unwrap();
    cache.direct_dependencies("b").unwrap();
    cache.persist(&path, FINGERPRINT).unwrap();

    let reloaded = CachedProvider::new(CountingProvider::new());
    assert_eq!(reloaded.load(&path, FINGERPRINT).unwrap(), 2);

    let batch = reloaded.direct_dependencies("b").unwrap();
    assert_eq!(batch.get("b").unwrap(), &["bdep"]);
    assert_eq!(reloaded.inner().calls.get(), 0);
}

#[test]
fn test_load_missing_or_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);
    let cache = CachedProvider::new(CountingProvider::new());

    assert_eq!(cache.load(&path, FINGERPRINT).unwrap(), 0);

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();
    assert_eq!(cache.load(&path, FINGERPRINT).unwrap(), 0);

    // Bare entry list without a fingerprint
    std::fs::write(&path, "[]").unwrap();
    assert_eq!(cache.load(&path, FINGERPRINT).unwrap(), 0);
}

#[test]
fn test_load_skips_file_from_other_configuration() {
    let dir = TempDir::new().unwrap();
    let path = cache_path(&dir);

    let cache = CachedProvider::new(CountingProvider::new());
    cache.direct_dependencies("a").unwrap();
    cache.persist(&path, "which=Depends,Imports,LinkingTo").unwrap();

    let reloaded = CachedProvider::new(CountingProvider::new());
    assert_eq!(
        reloaded.load(&path, "which=Depends,Imports,LinkingTo,Suggests").unwrap(),
        0
    );
    assert!(!reloaded.contains_fresh("a"));

    reloaded.direct_dependencies("a").unwrap();
    assert_eq!(reloaded.inner().calls.get(), 1);

    // The next persist replaces the file with the new configuration's answers
    reloaded
        .persist(&path, "which=Depends,Imports,LinkingTo,Suggests")
        .unwrap();
    let again = CachedProvider::new(CountingProvider::new());
    assert_eq!(again.load(&path, "which=Depends,Imports,LinkingTo").unwrap(), 0);
    assert_eq!(
        again.load(&path, "which=Depends,Imports,LinkingTo,Suggests").unwrap(),
        1
    );
}

#[test]
fn test_clear() {
    let cache = CachedProvider::new(CountingProvider::new());
    cache.direct_dependencies("a").unwrap();
    cache.clear();
    assert!(!cache.contains_fresh("a"));
}
