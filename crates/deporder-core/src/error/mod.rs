//! Error types and result aliases for deporder operations.
//!
//! Provides a unified error type that covers every failure a resolution run
//! can hit, from a single missing package up to a cyclic graph.

use thiserror::Error;

/// Unified error type for all deporder operations
#[derive(Error, Debug)]
pub enum DeporderError {
    // Provider errors
    #[error("Lookup failed for package '{package}': {reason}")]
    LookupFailure { package: String, reason: String },

    #[error("Malformed response from {provider} provider: {message}")]
    MalformedProviderResponse { provider: String, message: String },

    #[error("{provider} provider unavailable: {message}")]
    ProviderUnavailable {
        provider: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Resolution errors
    #[error("dependency graph has a cycle involving: {}", members.join(", "))]
    Cycle { members: Vec<String> },

    // Config errors
    #[error("Failed to parse TOML: {message}")]
    TomlParse { message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for deporder operations
pub type DeporderResult<T> = Result<T, DeporderError>;

impl DeporderError {
    /// Create a lookup failure for one package
    pub fn lookup(package: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LookupFailure {
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed-response error for the named provider
    pub fn malformed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedProviderResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error only affects a single package and the run can go on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DeporderError::LookupFailure { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            DeporderError::Cycle { .. } => {
                Some("Break the cycle in the listed packages' dependency declarations")
            },
            DeporderError::ProviderUnavailable { .. } => {
                Some("Check that Rscript is installed and on PATH, or pass --registry <FILE>")
            },
            DeporderError::MalformedProviderResponse { .. } => {
                Some("Run with --verbose to see the raw provider output")
            },
            DeporderError::ConfigValidation { .. } | DeporderError::TomlParse { .. } => {
                Some("Fix deporder.toml or remove the offending setting")
            },
            _ => None,
        }
    }
}
