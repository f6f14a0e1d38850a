//! `deporder <PACKAGE>` implementation.
//!
//! Resolves the root package's transitive dependencies, orders them for
//! installation and prints one `name version` line per non-base package.

use std::time::Instant;

use tracing::info;

use deporder_config::DeporderToml;
use deporder_core::error::{DeporderError, DeporderResult};
use deporder_resolver::{InstallPlan, InstallPlanner};

use super::session::RegistrySession;
use super::CommandContext;
use crate::OutputFormat;

/// Print the installation order of `package`
pub fn execute(package: &str, format: OutputFormat, ctx: &CommandContext) -> DeporderResult<()> {
    let start_time = Instant::now();

    let plan = plan(package, &ctx.config)?;
    let rendered = render(&plan, format)?;
    if !rendered.is_empty() {
        ctx.output.data(&rendered);
    }

    info!(
        "Ordered {} packages for {} in {:.2}s ({} base packages skipped)",
        plan.entries.len(),
        package,
        start_time.elapsed().as_secs_f64(),
        plan.skipped_base.len()
    );
    if plan.unknown_versions() > 0 {
        ctx.output.warn(&format!(
            "{} packages have no known version",
            plan.unknown_versions()
        ));
    }

    Ok(())
}

/// Compute the install plan for `package` with the configured registry
pub fn plan(package: &str, config: &DeporderToml) -> DeporderResult<InstallPlan> {
    let session = RegistrySession::open(config)?;
    let result = InstallPlanner::for_registry(session.registry())
        .with_extra_base(config.resolve.extra_base.iter().cloned())
        .plan(package);
    session.close();
    result
}

/// Render a plan for stdout
pub fn render(plan: &InstallPlan, format: OutputFormat) -> DeporderResult<String> {
    match format {
        OutputFormat::Text => Ok(plan
            .entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            serde_json::to_string_pretty(plan).map_err(|e| DeporderError::JsonParse {
                message: format!("Failed to serialize install plan: {}", e),
            })
        }
    }
}
