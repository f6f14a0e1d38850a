//! R expressions sent to the runtime and parsers for what they print
//!
//! Every query prints tab-separated lines so the output can be read without
//! requiring extra R packages such as jsonlite.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use deporder_core::utils::r_string_literal;
use deporder_core::{DeporderError, DependencyBatch, DependencyKind};

use crate::RegistryResult;

const PROVIDER: &str = "rscript";

/// Value R prints for a missing field
const R_NA: &str = "NA";

/// Priority R assigns to packages shipped with the base distribution
pub const BASE_PRIORITY: &str = "base";

/// One row of `installed.packages()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// `base`, `recommended` or absent
    pub priority: Option<String>,
    /// Repository the package was installed from
    pub repository: Option<String>,
    /// Publication date from the DESCRIPTION file
    pub published: Option<String>,
}

impl InstalledPackage {
    /// Check if this package is part of the base distribution
    pub fn is_base(&self) -> bool {
        self.priority.as_deref() == Some(BASE_PRIORITY)
    }
}

/// Expression printing `name<TAB>dep1,dep2` for the direct dependencies of `package`
pub fn dependencies_expression(package: &str, kinds: &[DependencyKind]) -> String {
    let which = kinds
        .iter()
        .map(|kind| r_string_literal(kind.field_name()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "deps <- tools::package_dependencies({}, which = c({}), recursive = FALSE); \
         for (n in names(deps)) cat(n, '\\t', paste(deps[[n]], collapse = ','), '\\n', sep = '')",
        r_string_literal(package),
        which
    )
}

/// Expression printing one tab-separated row per installed package
pub fn installed_expression() -> &'static str {
    "ip <- installed.packages(fields = c('Repository', 'Date/Publication')); \
     cat(paste(rownames(ip), ip[, 'Version'], ip[, 'Priority'], ip[, 'Repository'], \
     ip[, 'Date/Publication'], sep = '\\t'), sep = '\\n')"
}

/// Parse the output of [`dependencies_expression`]
///
/// R prints nothing when it has no answer at all; the requested package is
/// then recorded as a leaf so callers always get an entry for it.
pub fn parse_dependency_lines(package: &str, output: &str) -> RegistryResult<DependencyBatch> {
    let mut batch = DependencyBatch::new();

    for line in output.lines().filter(|line| !line.trim().is_empty()) {
        let (name, deps) = line.split_once('\t').ok_or_else(|| {
            DeporderError::malformed(
                PROVIDER,
                format!("expected 'name<TAB>deps' while querying {}, got '{}'", package, line),
            )
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(DeporderError::malformed(
                PROVIDER,
                format!("empty package name in line '{}'", line),
            ));
        }

        let deps = deps
            .split(',')
            .map(str::trim)
            .filter(|dep| !dep.is_empty() && *dep != R_NA)
            .map(str::to_string)
            .collect();
        batch.insert(name.to_string(), deps);
    }

    if !batch.contains(package) {
        batch.insert(package.to_string(), Vec::new());
    }

    Ok(batch)
}

/// Parse the output of [`installed_expression`]
///
/// When a package is installed in several libraries the first row wins, which
/// matches the order R searches `.libPaths()`.
pub fn parse_installed_table(output: &str) -> RegistryResult<IndexMap<String, InstalledPackage>> {
    let mut installed = IndexMap::new();

    for line in output.lines().filter(|line| !line.trim().is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        let &[name, version, priority, repository, published] = fields.as_slice() else {
            return Err(DeporderError::malformed(
                PROVIDER,
                format!("expected 5 tab-separated fields, got {} in '{}'", fields.len(), line),
            ));
        };

        installed
            .entry(name.to_string())
            .or_insert_with(|| InstalledPackage {
                name: name.to_string(),
                version: version.to_string(),
                priority: optional_field(priority),
                repository: optional_field(repository),
                published: optional_field(published),
            });
    }

    Ok(installed)
}

fn optional_field(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value != R_NA).then(|| value.to_string())
}
