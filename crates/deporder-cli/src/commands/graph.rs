//! `deporder --graph <PACKAGE>` implementation.

use deporder_config::DeporderToml;
use deporder_core::error::{DeporderError, DeporderResult};
use deporder_resolver::{resolve_full_dependency_graph, DependencyGraph};

use super::session::RegistrySession;
use super::CommandContext;

/// Print the dependency graph of `package`
pub fn execute(package: &str, ctx: &CommandContext) -> DeporderResult<()> {
    let graph = resolve(package, &ctx.config)?;
    ctx.output.data(&render(&graph)?);
    Ok(())
}

/// Resolve the dependency graph of `package`, base packages included
pub fn resolve(package: &str, config: &DeporderToml) -> DeporderResult<DependencyGraph> {
    let session = RegistrySession::open(config)?;
    let result = resolve_full_dependency_graph(session.registry(), package);
    session.close();
    result
}

/// Pretty JSON adjacency mapping in discovery order
pub fn render(graph: &DependencyGraph) -> DeporderResult<String> {
    serde_json::to_string_pretty(graph).map_err(|e| DeporderError::JsonParse {
        message: format!("Failed to serialize dependency graph: {}", e),
    })
}
