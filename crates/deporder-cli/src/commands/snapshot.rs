//! `deporder --snapshot [FILE]` implementation.
//!
//! Records which R and Python packages are installed, with versions, origins
//! and publication dates, as a dated JSON document.

use camino::Utf8PathBuf;

use deporder_core::error::{DeporderError, DeporderResult};
use deporder_registry::{RscriptClient, Snapshot};

use super::session::rscript_config;
use super::CommandContext;

/// Collect the inventory and print it, or write it to `output`
pub fn execute(output: Option<Utf8PathBuf>, ctx: &CommandContext) -> DeporderResult<()> {
    let client = RscriptClient::new(rscript_config(&ctx.config.rscript));
    let today = chrono::Local::now().date_naive();
    let snapshot = Snapshot::collect(&client, &ctx.config.snapshot.python, today)?;
    let json = snapshot.to_json_pretty()?;

    match output {
        Some(path) => {
            let path = if path.is_absolute() {
                path
            } else {
                ctx.cwd.join(path)
            };
            std::fs::write(&path, json)
                .map_err(|e| DeporderError::io(format!("Failed to write {}", path), e))?;
            ctx.output.success(&format!(
                "Wrote {} R and {} Python packages to {}",
                snapshot.r.len(),
                snapshot.python.len(),
                path
            ));
        }
        None => ctx.output.data(&json),
    }

    Ok(())
}
