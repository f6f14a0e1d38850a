//! Provider backed by a local R installation
//!
//! Dependency lists come from `tools::package_dependencies`, versions and the
//! base-package set from a single `installed.packages()` call made when the
//! registry connects.

use indexmap::IndexMap;
use tracing::info;

use deporder_core::utils::ensure_valid_package_name;
use deporder_core::{DeporderError, DependencyBatch};

use crate::api::{self, InstalledPackage};
use crate::client::{RscriptClient, RscriptConfig};
use crate::provider::{DependencyProvider, VersionProvider};
use crate::RegistryResult;

/// Registry answering queries against the R runtime on this machine
#[derive(Debug)]
pub struct RuntimeRegistry {
    client: RscriptClient,
    installed: IndexMap<String, InstalledPackage>,
}

impl RuntimeRegistry {
    /// Start talking to R and load the installed-package table
    pub fn connect(config: RscriptConfig) -> RegistryResult<Self> {
        let client = RscriptClient::new(config);
        let installed = api::parse_installed_table(&client.eval(api::installed_expression())?)?;

        info!(
            "Connected to {} ({} installed packages, {} base)",
            client.config().program,
            installed.len(),
            installed.values().filter(|pkg| pkg.is_base()).count()
        );

        Ok(Self { client, installed })
    }

    /// Rows of `installed.packages()` in library order
    pub fn installed(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.installed.values()
    }

    /// The runner used for queries
    pub fn client(&self) -> &RscriptClient {
        &self.client
    }
}

impl DependencyProvider for RuntimeRegistry {
    fn direct_dependencies(&self, name: &str) -> RegistryResult<DependencyBatch> {
        ensure_valid_package_name(name)?;

        let expression = api::dependencies_expression(name, &self.client.config().which);
        api::parse_dependency_lines(name, &self.client.eval(&expression)?)
    }
}

impl VersionProvider for RuntimeRegistry {
    fn version(&self, name: &str) -> RegistryResult<String> {
        self.installed
            .get(name)
            .map(|pkg| pkg.version.clone())
            .ok_or_else(|| DeporderError::lookup(name, "not found in installed.packages()"))
    }

    fn is_base_package(&self, name: &str) -> bool {
        self.installed.get(name).is_some_and(InstalledPackage::is_base)
    }
}
