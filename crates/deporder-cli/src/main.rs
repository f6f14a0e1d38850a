//! # deporder-cli
//!
//! Prints the order in which an R package and its transitive dependencies
//! have to be installed.
//!
//! This is the entry point of the `deporder` binary. It parses arguments, sets
//! up logging and the panic hook, loads configuration and dispatches to the
//! command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use deporder_core::error::DeporderResult;

mod commands;
mod output;

use commands::{Action, CommandContext};
use output::errors::ErrorFormatter;

/// Version banner for `--version`
const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nBuilt: ",
    env!("BUILD_DATE"),
    "\nTarget: ",
    env!("BUILD_TARGET"),
    "\nRust: ",
    env!("RUSTC_VERSION")
);

/// Installation order for R packages
///
/// The package name is the only positional argument, so any valid R package
/// name is accepted as is; the other outputs are selected with flags.
#[derive(Parser, Debug)]
#[command(
    name = "deporder",
    version,
    long_version = LONG_VERSION,
    about = "Print the installation order of an R package's dependencies",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Package to order
    #[arg(value_name = "PACKAGE", required_unless_present = "snapshot")]
    pub package: Option<String>,

    /// How to print the installation order [default: text]
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Print the resolved dependency graph as JSON instead of the order
    #[arg(long, conflicts_with = "format")]
    pub graph: bool,

    /// Print an inventory of installed R and Python packages as JSON, or
    /// write it to FILE
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        conflicts_with_all = ["package", "format", "graph"]
    )]
    pub snapshot: Option<Option<Utf8PathBuf>>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Read packages from a manifest file instead of the R installation
    #[arg(long, value_name = "FILE")]
    pub registry: Option<Utf8PathBuf>,

    /// Use this configuration file instead of searching for deporder.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Neither read nor write the dependency lookup cache
    #[arg(long)]
    pub no_cache: bool,
}

impl Cli {
    /// The action selected by the parsed flags
    pub fn action(&self) -> Option<Action> {
        if let Some(output) = &self.snapshot {
            return Some(Action::Snapshot {
                output: output.clone(),
            });
        }

        let package = self.package.clone()?;
        if self.graph {
            Some(Action::Graph { package })
        } else {
            Some(Action::Resolve {
                package,
                format: self.format.unwrap_or(OutputFormat::Text),
            })
        }
    }
}

/// Rendering of an install plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `name version` line per package
    Text,
    /// The whole plan as JSON
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    debug!("Starting deporder v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> DeporderResult<()> {
    // clap prints help before we get here when nothing was selected
    let Some(action) = cli.action() else {
        return Ok(());
    };

    let ctx = CommandContext::new(cli.config.clone(), cli_overrides(&cli))?;
    commands::dispatch_command(action, &ctx)
}

fn cli_overrides(cli: &Cli) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(registry) = &cli.registry {
        overrides.insert("registry".to_string(), registry.to_string());
    }
    if cli.no_cache {
        overrides.insert("no_cache".to_string(), "true".to_string());
    }
    overrides
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "deporder={level},deporder_core={level},deporder_config={level},\
             deporder_registry={level},deporder_resolver={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("deporder encountered an unexpected error: {}", panic_info);
        eprintln!("deporder crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/deporder/deporder/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
