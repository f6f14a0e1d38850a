//! Configuration parsing for deporder
//!
//! This crate handles parsing and validation of deporder.toml files and
//! layers global, project, environment and command-line settings into one
//! configuration.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, LoadedConfig};
pub use self::toml::{
    CacheSection, DeporderToml, ProviderKind, RegistrySection, ResolveSection, RscriptSection,
    SnapshotSection,
};

use deporder_core::error::DeporderError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, DeporderError>;
