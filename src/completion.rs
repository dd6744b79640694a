//! Shell completion scripts for gh-pr-review.
//!
//! The CLI definition lives in the binary, so callers pass the clap
//! [`Command`] in and get the generated script back.

use crate::error::{Result, ReviewError};
use clap::Command;
use clap_complete::{generate, Shell};

/// Binary name used in generated scripts.
pub const BIN_NAME: &str = "gh-pr-review";

/// Shells a completion script can be generated for.
pub const SUPPORTED_SHELLS: &[&str] = &["bash", "zsh", "fish"];

/// Supported shell types for completion scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

impl ShellType {
    /// Convert to the `clap_complete::Shell` type.
    pub fn to_clap_shell(self) -> Shell {
        match self {
            ShellType::Bash => Shell::Bash,
            ShellType::Zsh => Shell::Zsh,
            ShellType::Fish => Shell::Fish,
        }
    }

    /// Get the display name of the shell.
    pub fn name(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
        }
    }

    /// Parse a shell name or a shell path such as `/usr/bin/zsh`.
    pub fn from_name(name: &str) -> Result<Self> {
        let base = std::path::Path::new(name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(name);

        match base.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellType::Bash),
            "zsh" => Ok(ShellType::Zsh),
            "fish" => Ok(ShellType::Fish),
            _ => Err(ReviewError::InvalidArgument(format!(
                "Unsupported shell: '{}'. Supported shells are: {}.",
                base,
                SUPPORTED_SHELLS.join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Generate a completion script for `cmd`.
pub fn generate_completion_script(shell: ShellType, cmd: &mut Command) -> String {
    let mut buf = Vec::new();
    generate(shell.to_clap_shell(), cmd, BIN_NAME, &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}
