//! Blocking `Rscript` runner used by the R runtime provider

use std::process::{Command, Output};

use tracing::debug;

use deporder_core::error::DeporderError;
use deporder_core::utils::r_string_literal;
use deporder_core::DependencyKind;

use crate::RegistryResult;

const PROVIDER: &str = "rscript";

/// Settings for talking to the R runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RscriptConfig {
    /// Program to launch, looked up on PATH when not absolute
    pub program: String,
    /// CRAN mirror used by `available.packages()`; R's own option when unset
    pub repos: Option<String>,
    /// DESCRIPTION fields that count as dependencies
    pub which: Vec<DependencyKind>,
}

impl Default for RscriptConfig {
    fn default() -> Self {
        Self {
            program: "Rscript".to_string(),
            repos: None,
            which: DependencyKind::DEFAULT.to_vec(),
        }
    }
}

impl RscriptConfig {
    /// Identity of the answers this configuration produces.
    ///
    /// Cached dependency lookups are only valid for the runtime, mirror and
    /// dependency fields that produced them.
    pub fn fingerprint(&self) -> String {
        let which: Vec<&str> = self.which.iter().map(|kind| kind.field_name()).collect();
        format!(
            "program={};repos={};which={}",
            self.program,
            self.repos.as_deref().unwrap_or(""),
            which.join(",")
        )
    }
}

/// Runs R expressions through `Rscript -e` and captures stdout
#[derive(Debug, Clone)]
pub struct RscriptClient {
    config: RscriptConfig,
}

impl RscriptClient {
    /// Create a client for the given configuration
    pub fn new(config: RscriptConfig) -> Self {
        Self { config }
    }

    /// Configuration this client was built with
    pub fn config(&self) -> &RscriptConfig {
        &self.config
    }

    fn base_command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command.arg("-e");
        command
    }

    /// Statements run before every expression
    fn prelude(&self) -> String {
        match &self.config.repos {
            Some(repos) => format!("options(repos = c(CRAN = {})); ", r_string_literal(repos)),
            None => String::new(),
        }
    }

    /// Evaluate `expression` and return everything it printed on stdout
    pub fn eval(&self, expression: &str) -> RegistryResult<String> {
        let script = format!("{}{}", self.prelude(), expression);
        debug!("Rscript -e {}", script);

        let output = self
            .base_command()
            .arg(&script)
            .output()
            .map_err(|e| DeporderError::ProviderUnavailable {
                provider: PROVIDER.to_string(),
                message: format!("failed to launch '{}'", self.config.program),
                source: Some(e),
            })?;

        Self::check_output(&self.config.program, output)
    }

    fn check_output(program: &str, output: Output) -> RegistryResult<String> {
        if !output.status.success() {
            return Err(DeporderError::ProviderUnavailable {
                provider: PROVIDER.to_string(),
                message: format!(
                    "'{}' exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
                source: None,
            });
        }

        String::from_utf8(output.stdout)
            .map_err(|e| DeporderError::malformed(PROVIDER, format!("output is not UTF-8: {}", e)))
    }
}
