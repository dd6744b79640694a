//! Basic message output functions.
//!
//! Messages are written to stderr.

use super::colors::*;

/// Format an error message the way [`print_error`] prints it.
pub fn format_error(msg: &str) -> String {
    format!("{RED}{BOLD}Error:{RESET} {}", msg)
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format_error(msg));
}
