//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for
//! Tracklens. It provides platform-appropriate data storage locations and an
//! optional `config.json` for settings that rarely change.
//!
//! ## Data Storage
//!
//! Tracklens stores its database in the platform-standard data directory:
//! - Linux: `~/.local/share/tracklens/`
//! - macOS: `~/Library/Application Support/tracklens/`
//! - Windows: `%APPDATA%\tracklens\`
//!
//! ## Config File
//!
//! `config.json` in the same directory may set any of:
//!
//! ```json
//! {
//!   "db_path": "/srv/listening/tracklens.db",
//!   "api_base_url": "https://api.spotify.com/v1",
//!   "history_limit": 50,
//!   "request_timeout_secs": 30
//! }
//! ```
//!
//! Missing keys fall back to their defaults; a missing file is not an error.

use crate::spotify::{DEFAULT_API_BASE, MAX_HISTORY_LIMIT};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "tracklens";
const DB_FILE: &str = "tracklens.db";
const CONFIG_FILE: &str = "config.json";

/// Returns the platform-appropriate data directory for Tracklens, creating it
/// if necessary.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The tracklens subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!(
            "Failed to create Tracklens data directory at {}. Please check file permissions.",
            app_dir.display()
        )
    })?;

    Ok(app_dir)
}

/// Returns the platform-appropriate database file path.
///
/// # Examples
///
/// ```no_run
/// use tracklens::config::get_db_path;
///
/// let db_path = get_db_path()?;
/// println!("Database location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Root of the streaming service's web API
    pub api_base_url: String,
    /// Plays requested per ingestion run
    pub history_limit: u32,
    pub request_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            db_path: get_db_path().unwrap_or_else(|_| PathBuf::from(DB_FILE)),
            api_base_url: DEFAULT_API_BASE.to_string(),
            history_limit: MAX_HISTORY_LIMIT,
            request_timeout_secs: 30,
        }
    }
}

impl RuntimeConfig {
    /// Load `config.json` from the data directory, or defaults if it is absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&get_data_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from an explicit file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Create configuration with explicit database path
    #[must_use]
    pub fn with_db_path(self, db_path: PathBuf) -> Self {
        Self { db_path, ..self }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_db_path_structure() {
        let path = get_db_path().expect("Should get valid path");

        assert_eq!(path.file_name().unwrap(), "tracklens.db");
        let parent = path.parent().expect("Should have parent directory");
        assert_eq!(parent.file_name().unwrap(), "tracklens");
        assert!(parent.is_dir());
    }

    #[test]
    fn test_missing_config_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = RuntimeConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.api_base_url, "https://api.spotify.com/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "history_limit": 20, "db_path": "/tmp/plays.db" }"#).unwrap();

        let config = RuntimeConfig::load_from(&path).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.db_path, PathBuf::from("/tmp/plays.db"));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(RuntimeConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_with_db_path() {
        let config = RuntimeConfig::default().with_db_path(PathBuf::from("elsewhere.db"));
        assert_eq!(config.db_path, PathBuf::from("elsewhere.db"));
    }
}
