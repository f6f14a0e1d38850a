//! Command implementations and dispatch logic.
//!
//! Each action is a blocking function taking a [`CommandContext`].

use std::collections::HashMap;

use camino::Utf8PathBuf;
use tracing::info;

use deporder_config::{ConfigLayering, ConfigLoader, DeporderToml};
use deporder_core::error::{DeporderError, DeporderResult};

pub mod graph;
pub mod resolve;
pub mod session;
pub mod snapshot;


use crate::{output::OutputHandler, OutputFormat};

/// What one invocation does, selected by command-line flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print the installation order of a package
    Resolve {
        package: String,
        format: OutputFormat,
    },
    /// Print the resolved dependency graph as JSON
    Graph { package: String },
    /// Print or write an inventory of installed packages
    Snapshot { output: Option<Utf8PathBuf> },
}

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    pub config: DeporderToml,
}

impl CommandContext {
    /// Load configuration for the current directory
    pub fn new(
        explicit_config: Option<Utf8PathBuf>,
        cli_overrides: HashMap<String, String>,
    ) -> DeporderResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| DeporderError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| DeporderError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("{} is not valid UTF-8", path.display()),
        })?;

        let loaded = ConfigLoader::new(cwd.clone())
            .with_explicit(explicit_config)
            .load(ConfigLayering::collect_env_overrides(), cli_overrides)?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
            config: loaded.config,
        })
    }
}

/// Dispatch an action to its handler
pub fn dispatch_command(action: Action, ctx: &CommandContext) -> DeporderResult<()> {
    match action {
        Action::Resolve { package, format } => {
            info!("Resolving installation order for {}", package);
            resolve::execute(&package, format, ctx)
        }
        Action::Graph { package } => {
            info!("Resolving dependency graph for {}", package);
            graph::execute(&package, ctx)
        }
        Action::Snapshot { output } => {
            info!("Collecting installed packages");
            snapshot::execute(output, ctx)
        }
    }
}
