//! Inventory of installed R and Python packages
//!
//! Produces a dated JSON document recording what is installed where, useful
//! next to an installation order when writing build recipes.

use std::process::Command;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use deporder_core::DeporderError;

use crate::api::{self, InstalledPackage};
use crate::client::RscriptClient;
use crate::RegistryResult;

/// Placeholder for fields a runtime does not report
pub const UNKNOWN_FIELD: &str = "unknown";

/// What is known about one installed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledInfo {
    pub version: String,
    pub origin: String,
    pub date: String,
}

impl From<&InstalledPackage> for InstalledInfo {
    fn from(pkg: &InstalledPackage) -> Self {
        Self {
            version: pkg.version.clone(),
            origin: pkg.repository.clone().unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            date: pkg.published.clone().unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
        }
    }
}

/// Dated inventory of installed packages per runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub python: IndexMap<String, InstalledInfo>,
    pub r: IndexMap<String, InstalledInfo>,
}

/// Row of `pip list --format=json`
#[derive(Debug, Deserialize)]
struct PipPackage {
    name: String,
    version: String,
}

/// Report printed by `pip inspect` (pip 22.2 and later)
#[derive(Debug, Deserialize)]
struct PipInspectReport {
    installed: Vec<PipInspectEntry>,
}

#[derive(Debug, Deserialize)]
struct PipInspectEntry {
    metadata: PipMetadata,
}

/// Distribution METADATA as JSON: header names lowercased, `-` turned into `_`
#[derive(Debug, Deserialize)]
struct PipMetadata {
    name: String,
    version: String,
    #[serde(default)]
    home_page: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl Snapshot {
    /// Collect the inventory from both runtimes.
    ///
    /// A runtime that cannot be launched leaves its section empty; output
    /// that cannot be parsed is an error.
    pub fn collect(rscript: &RscriptClient, python: &str, date: NaiveDate) -> RegistryResult<Self> {
        let r = match rscript.eval(api::installed_expression()) {
            Ok(output) => r_section(&output)?,
            Err(DeporderError::ProviderUnavailable { message, .. }) => {
                warn!("Skipping R packages: {}", message);
                IndexMap::new()
            }
            Err(other) => return Err(other),
        };

        let python = match python_packages(python) {
            Ok(section) => section,
            Err(DeporderError::ProviderUnavailable { message, .. }) => {
                warn!("Skipping Python packages: {}", message);
                IndexMap::new()
            }
            Err(other) => return Err(other),
        };

        Ok(Self { date, python, r })
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DeporderError::JsonParse {
            message: format!("Failed to serialize snapshot: {}", e),
        })
    }
}

/// Python packages with their METADATA, falling back to `pip list` when
/// pip is too old for `pip inspect`
fn python_packages(python: &str) -> RegistryResult<IndexMap<String, InstalledInfo>> {
    match run_pip(python, &["inspect"]) {
        Ok(output) => python_inspect_section(&output),
        Err(DeporderError::ProviderUnavailable { message, .. }) => {
            debug!("pip inspect unavailable, using pip list: {}", message);
            python_section(&run_pip(python, &["list", "--format=json"])?)
        }
        Err(other) => Err(other),
    }
}

fn run_pip(python: &str, args: &[&str]) -> RegistryResult<String> {
    let output = Command::new(python)
        .args(["-m", "pip"])
        .args(args)
        .output()
        .map_err(|e| DeporderError::ProviderUnavailable {
            provider: "python".to_string(),
            message: format!("failed to launch '{}'", python),
            source: Some(e),
        })?;

    if !output.status.success() {
        return Err(DeporderError::ProviderUnavailable {
            provider: "python".to_string(),
            message: format!(
                "'{} -m pip {}' exited with {}: {}",
                python,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            source: None,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn r_section(output: &str) -> RegistryResult<IndexMap<String, InstalledInfo>> {
    Ok(api::parse_installed_table(output)?
        .values()
        .map(|pkg| (pkg.name.clone(), InstalledInfo::from(pkg)))
        .collect())
}

fn python_section(output: &str) -> RegistryResult<IndexMap<String, InstalledInfo>> {
    let packages: Vec<PipPackage> = serde_json::from_str(output)
        .map_err(|e| DeporderError::malformed("python", format!("unexpected pip output: {}", e)))?;

    Ok(packages
        .into_iter()
        .map(|pkg| {
            let info = InstalledInfo {
                version: pkg.version,
                origin: UNKNOWN_FIELD.to_string(),
                date: UNKNOWN_FIELD.to_string(),
            };
            (pkg.name, info)
        })
        .collect())
}

fn python_inspect_section(output: &str) -> RegistryResult<IndexMap<String, InstalledInfo>> {
    let report: PipInspectReport = serde_json::from_str(output).map_err(|e| {
        DeporderError::malformed("python", format!("unexpected pip inspect output: {}", e))
    })?;

    Ok(report
        .installed
        .into_iter()
        .map(|entry| {
            let meta = entry.metadata;
            let info = InstalledInfo {
                version: meta.version,
                origin: known_or_unknown(meta.home_page),
                date: known_or_unknown(meta.date),
            };
            (meta.name, info)
        })
        .collect())
}

fn known_or_unknown(field: Option<String>) -> String {
    match field {
        Some(value) if !value.trim().is_empty() && value != "UNKNOWN" => value,
        _ => UNKNOWN_FIELD.to_string(),
    }
}
