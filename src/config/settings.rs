//! User settings and preferences
//!
//! Manages application settings stored in ~/.pgbrowse/config.toml

use crate::config::connections::config_dir;
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Page size used by `fetch_rows` when the caller gives none
    #[serde(default = "default_row_limit")]
    pub default_row_limit: u32,

    /// Reconnect target while dropping the currently connected database
    #[serde(default = "default_admin_database")]
    pub admin_database: String,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_row_limit() -> u32 {
    100
}

fn default_admin_database() -> String {
    "postgres".to_string()
}

fn default_log_filter() -> String {
    "pgbrowse=info,warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_row_limit: default_row_limit(),
            admin_database: default_admin_database(),
            log_filter: default_log_filter(),
        }
    }
}

/// Load settings from ~/.pgbrowse/config.toml
pub fn load_settings() -> ConfigResult<Settings> {
    load_settings_from(&config_dir()?.join("config.toml"))
}

/// Load settings from a file, defaulting when it doesn't exist
pub fn load_settings_from(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}
