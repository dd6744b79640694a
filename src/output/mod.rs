//! Terminal output for gh-pr-review.
//!
//! Command results go to stdout as a single JSON document; diagnostics go to
//! stderr so the JSON stays machine-readable.
//!
//! - [`json`] - Pretty-printed JSON documents
//! - [`messages`] - Error messages

pub mod json;
pub mod messages;

/// ANSI color codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const RED: &str = "\x1b[31m";
}

pub use colors::*;

pub use json::write_json;
pub use messages::{format_error, print_error};
