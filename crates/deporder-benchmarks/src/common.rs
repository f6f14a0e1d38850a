//! Common utilities for benchmarks

use criterion::Criterion;
use indexmap::IndexMap;
use pprof::criterion::{Output, PProfProfiler};

use deporder_registry::{ManifestEntry, ManifestRegistry};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Name of the `index`-th synthetic package
pub fn package_name(index: usize) -> String {
    format!("pkg{}", index)
}

/// Acyclic registry of `size` packages rooted at `pkg0`.
///
/// Package `i` depends on up to `fanout` packages with a higher index, so the
/// graph stays a DAG with plenty of shared dependencies. Every tenth package
/// is marked base.
pub fn layered_registry(size: usize, fanout: usize) -> ManifestRegistry {
    let mut packages = IndexMap::with_capacity(size);

    for i in 0..size {
        let remaining = size - i - 1;
        let mut depends = Vec::new();
        if remaining > 0 {
            for k in 0..fanout.min(remaining) {
                let target = i + 1 + (k * 7 + i) % remaining;
                let name = package_name(target);
                if !depends.contains(&name) {
                    depends.push(name);
                }
            }
        }

        packages.insert(
            package_name(i),
            ManifestEntry {
                version: Some(format!("1.{}.0", i)),
                depends,
                base: i > 0 && i % 10 == 0,
            },
        );
    }

    ManifestRegistry::from_entries(packages)
}

/// Output in the shape the R dependency expression prints
pub fn dependency_lines(size: usize, fanout: usize) -> String {
    (0..size)
        .map(|i| {
            let deps: Vec<String> = (1..=fanout).map(|k| package_name(i + k)).collect();
            format!("{}\t{}\n", package_name(i), deps.join(","))
        })
        .collect()
}

/// Output in the shape the R installed-packages expression prints
pub fn installed_table(size: usize) -> String {
    (0..size)
        .map(|i| {
            let priority = if i % 10 == 0 { "base" } else { "NA" };
            format!(
                "{}\t1.{}.0\t{}\tCRAN\t2024-01-01 00:00:00 UTC\n",
                package_name(i),
                i,
                priority
            )
        })
        .collect()
}
