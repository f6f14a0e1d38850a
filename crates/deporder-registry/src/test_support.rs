//! Fake `Rscript` executables for provider tests

use std::fs;
use std::path::Path;

/// Write a shell script standing in for `Rscript` and return its path.
///
/// The script receives `-e <expression>` like the real thing; `body` is a
/// `case "$2" in ... esac` dispatch or any other shell snippet.
#[cfg(unix)]
pub(crate) fn write_fake_rscript(dir: &Path, body: &str) -> String {
    write_fake_program(dir, "Rscript", body)
}

/// Write an executable shell script called `name` into `dir`
#[cfg(unix)]
pub(crate) fn write_fake_program(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake program");
    let mut permissions = fs::metadata(&path).expect("stat fake program").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("chmod fake program");
    path.to_string_lossy().into_owned()
}

/// Script answering the installed-table and dependency queries for a small
/// R library: `app -> (ggplot2, stats)`, `ggplot2 -> (rlang, stats)`
#[cfg(unix)]
pub(crate) const SMALL_LIBRARY: &str = r#"case "$2" in
  *installed.packages*)
    printf 'stats\t4.3.2\tbase\tNA\tNA\n'
    printf 'rlang\t1.1.3\tNA\tCRAN\t2024-01-10 12:20:02 UTC\n'
    printf 'ggplot2\t3.4.4\tNA\tCRAN\t2023-10-12 22:20:02 UTC\n'
    ;;
  *"package_dependencies('app'"*)
    printf 'app\tggplot2,stats\n'
    ;;
  *"package_dependencies('ggplot2'"*)
    printf 'ggplot2\trlang,stats\n'
    ;;
  *package_dependencies*)
    ;;
  *)
    echo "unexpected expression: $2" >&2
    exit 2
    ;;
esac"#;
