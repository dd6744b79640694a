use crate::error::{Result, ReviewError};
use crate::gh::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "gh-pr-review";

/// Filename for the config file
const CONFIG_FILENAME: &str = "config.toml";

/// User configuration for gh-pr-review.
///
/// Every key is optional; a missing file or a missing key falls back to the
/// defaults below.
///
/// # Example
///
/// ```toml
/// # Host used when GH_HOST is unset and the selector names none
/// host = "github.example.com"
///
/// # Default page size for listing commands (1-100)
/// per_page = 50
///
/// # Submit your own pending reviews when they block a threaded reply
/// auto_submit_pending = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default GitHub host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Default page size for `comments ids`, `review latest-id` and `review pending-id`.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Whether a reply blocked by a pending review submits it and retries.
    ///
    /// When `false`, the blocked reply fails with a recoverable conflict instead.
    #[serde(default = "default_true")]
    pub auto_submit_pending: bool,
}

/// Helper function for serde default values (true).
fn default_true() -> bool {
    true
}

fn default_per_page() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            per_page: MAX_PAGE_SIZE,
            auto_submit_pending: true,
        }
    }
}

impl Config {
    /// Host to talk to: `GH_HOST` wins over the configured host.
    pub fn effective_host(&self, env_host: Option<&str>) -> Option<String> {
        env_host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .or_else(|| self.host.as_deref().map(str::trim).filter(|h| !h.is_empty()))
            .map(str::to_string)
    }

    /// Page size to use when a command flag does not set one.
    pub fn per_page_or(&self, flag: Option<u32>) -> u32 {
        flag.unwrap_or(self.per_page)
    }
}

/// Check that configured values are usable.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.per_page == 0 || config.per_page > MAX_PAGE_SIZE {
        return Err(ReviewError::Config(format!(
            "per_page must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.per_page
        )));
    }
    if let Some(host) = &config.host {
        if host.trim().is_empty() || host.contains('/') {
            return Err(ReviewError::Config(format!(
                "host must be a bare hostname, got {:?}",
                host
            )));
        }
    }
    Ok(())
}

/// Get the gh-pr-review config directory path (~/.config/gh-pr-review/).
///
/// Returns the path to the config directory. Does not create the directory.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ReviewError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Get the path to the config file.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILENAME))
}

/// Load the configuration from `~/.config/gh-pr-review/config.toml`.
///
/// A missing file yields the defaults; nothing is written to disk.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Load and validate the configuration at `path`.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ReviewError::ConfigParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_dir_returns_path_ending_with_app_name() {
        let result = config_dir().unwrap();
        assert!(result.ends_with("gh-pr-review"));
        assert!(result.parent().unwrap().ends_with(".config"));
    }

    #[test]
    fn test_missing_file_yields_defaults_without_creating_it() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = load_config_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.per_page, 100);
        assert!(config.auto_submit_pending);
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "auto_submit_pending = false\n").unwrap();

        let config = load_config_from(&path).unwrap();

        assert!(!config.auto_submit_pending);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.host, None);
    }

    #[test]
    fn test_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "host = \"github.example.com\"\nper_page = 25\nauto_submit_pending = true\n",
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();

        assert_eq!(config.host.as_deref(), Some("github.example.com"));
        assert_eq!(config.per_page, 25);
    }

    #[test]
    fn test_invalid_toml_names_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "per_page = [oops").unwrap();

        let err = load_config_from(&path).unwrap_err();

        assert!(matches!(err, ReviewError::ConfigParse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_out_of_range_per_page_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "per_page = 500\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("per_page"));
    }

    #[test]
    fn test_validate_config_rejects_host_with_path() {
        let config = Config {
            host: Some("github.com/octo".to_string()),
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_effective_host_precedence() {
        let config = Config {
            host: Some("ghe.example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.effective_host(Some("env.example.com")).as_deref(),
            Some("env.example.com")
        );
        assert_eq!(
            config.effective_host(Some("  ")).as_deref(),
            Some("ghe.example.com")
        );
        assert_eq!(Config::default().effective_host(None), None);
    }

    #[test]
    fn test_per_page_or_prefers_flag() {
        let config = Config {
            per_page: 30,
            ..Config::default()
        };
        assert_eq!(config.per_page_or(Some(10)), 10);
        assert_eq!(config.per_page_or(None), 30);
    }
}
