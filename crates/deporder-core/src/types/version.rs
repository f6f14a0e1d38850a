//! Version records attached to resolved packages.

use std::fmt;

use serde::{Serialize, Serializer};

use super::PackageName;

/// Marker printed when a version could not be resolved
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Version of a package as far as the provider could tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVersion {
    /// Version string reported by the provider
    Known(String),
    /// Lookup failed; the reason is kept for diagnostics
    Unknown { reason: String },
}

impl ResolvedVersion {
    /// Version string, or `None` when unresolved
    pub fn as_known(&self) -> Option<&str> {
        match self {
            ResolvedVersion::Known(version) => Some(version),
            ResolvedVersion::Unknown { .. } => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ResolvedVersion::Known(_))
    }
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedVersion::Known(version) => f.write_str(version),
            ResolvedVersion::Unknown { .. } => f.write_str(UNKNOWN_VERSION),
        }
    }
}

impl Serialize for ResolvedVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A package paired with its resolved version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionRecord {
    pub name: PackageName,
    pub version: ResolvedVersion,
}

impl VersionRecord {
    /// Create a record with a known version
    pub fn known(name: impl Into<PackageName>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: ResolvedVersion::Known(version.into()),
        }
    }

    /// Create a record whose version could not be resolved
    pub fn unknown(name: impl Into<PackageName>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: ResolvedVersion::Unknown {
                reason: reason.into(),
            },
        }
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}
