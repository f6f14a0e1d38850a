//! Utility functions and helpers.
//!
//! Common functionality used across multiple deporder crates.

pub mod name;

// Re-export commonly used utilities
pub use name::{ensure_valid_package_name, is_valid_package_name, r_string_literal};
