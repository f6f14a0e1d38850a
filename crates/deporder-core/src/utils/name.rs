//! Package name utilities.
//!
//! Names are embedded verbatim into R expressions, so anything that is not a
//! legal R package name must be rejected before it reaches the runtime.

use crate::error::{DeporderError, DeporderResult};

/// Check if a name follows R's package naming rules
///
/// A valid name has at least two characters, contains only ASCII letters,
/// digits and `.`, starts with a letter and does not end with `.`.
pub fn is_valid_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    name.len() >= 2
        && first.is_ascii_alphabetic()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
        && !name.ends_with('.')
}

/// Validate a package name, reporting a lookup failure when it is illegal
pub fn ensure_valid_package_name(name: &str) -> DeporderResult<()> {
    if is_valid_package_name(name) {
        Ok(())
    } else {
        Err(DeporderError::lookup(name, "not a valid R package name"))
    }
}

/// Quote a string as a single-quoted R literal
pub fn r_string_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}
