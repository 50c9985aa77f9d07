//! Configuration file loading.
//!
//! This module handles loading tinyutil configuration from TOML files
//! at XDG-compliant locations.

use super::error::ConfigError;
use super::types::TinyutilConfig;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "tinyutil.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
pub const APP_NAME: &str = "tinyutil";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./tinyutil.toml` (project-local)
/// 2. `~/.config/tinyutil/config.toml` (XDG config)
///
/// Returns an empty configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn load() -> Result<TinyutilConfig, ConfigError> {
    for path in search_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading configuration");
            return from_path(&path);
        }
    }

    Ok(TinyutilConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file contains invalid TOML
/// - The TOML doesn't match the expected schema
pub fn from_path(path: &Path) -> Result<TinyutilConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::new(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        ConfigError::new(
            "config_file",
            format!("failed to parse '{}': {}", path.display(), e.reason),
        )
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or doesn't match the schema.
///
/// # Example
///
/// ```rust
/// let config = tinyutil::config::from_str(r#"
/// [harness]
/// run_timeout_ms = 1500
/// "#).unwrap();
/// assert_eq!(config.harness.run_timeout_ms, Some(1500));
/// ```
pub fn from_str(toml_str: &str) -> Result<TinyutilConfig, ConfigError> {
    toml::from_str(toml_str)
        .map_err(|e| ConfigError::new("config", format!("invalid TOML: {e}")))
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the path to the XDG config directory for tinyutil.
///
/// This is `~/.config/tinyutil` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
