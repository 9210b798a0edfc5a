//! Configuration management
//!
//! This module handles loading and validation of the mnkeeper tool settings.
//! Configuration is stored in TOML format at ~/.mnkeeper/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **monitor**: Default polling interval for `monitor`
//! - **network**: User agent and timeouts for RPC calls and downloads
//!
//! Coin settings (RPC credentials, masternode keys) do not live here; they
//! belong to each coin's own `.conf` file in its data directory.
//!
//! # Examples
//!
//! ```no_run
//! use mnkeeper_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Refresh every {}s", config.monitor.refresh_secs);
//! # Ok(())
//! # }
//! ```

use sdk::MnError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Monitor defaults
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP settings shared by RPC and downloads
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between two `getinfo` polls
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

/// Network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// User agent sent with downloads
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for a single RPC call, in seconds
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Timeout for a whole artifact download, in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("mnkeeper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_rpc_timeout_secs() -> u64 {
    15
}

fn default_download_timeout_secs() -> u64 {
    3600
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it with
    /// defaults on first run
    pub fn load_or_create() -> Result<Self, MnError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load and validate configuration from `path`
    pub fn load_from_path(path: &Path) -> Result<Self, MnError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| MnError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| MnError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn create_default(path: &Path) -> Result<Self, MnError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MnError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| MnError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| MnError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.mnkeeper/config.toml)
    fn default_config_path() -> Result<PathBuf, MnError> {
        Ok(home_dir()?.join(".mnkeeper").join("config.toml"))
    }

    /// Reject unknown log levels and zero intervals
    pub fn validate(&self) -> Result<(), MnError> {
        validate_log_level(&self.core.log_level)?;

        if self.monitor.refresh_secs == 0 {
            return Err(MnError::Config(
                "monitor.refresh_secs must be greater than 0".to_string(),
            ));
        }
        if self.network.rpc_timeout_secs == 0 {
            return Err(MnError::Config(
                "network.rpc_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.network.download_timeout_secs == 0 {
            return Err(MnError::Config(
                "network.download_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.monitor.refresh_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.network.rpc_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.network.download_timeout_secs)
    }
}

/// Check `level` against the levels `tracing` understands
pub fn validate_log_level(level: &str) -> Result<(), MnError> {
    let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&level) {
        return Err(MnError::Config(format!(
            "Invalid log level '{}'. Must be one of: {}",
            level,
            valid_log_levels.join(", ")
        )));
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory
///
/// Only `~` and `~/...` are expanded; `~user` forms are left alone.
pub fn expand_path(path: &Path) -> Result<PathBuf, MnError> {
    let raw = path
        .to_str()
        .ok_or_else(|| MnError::Config(format!("Path is not valid UTF-8: {:?}", path)))?;

    match raw.strip_prefix('~') {
        Some("") => home_dir(),
        Some(rest) if rest.starts_with('/') => Ok(home_dir()?.join(&rest[1..])),
        _ => Ok(path.to_path_buf()),
    }
}

fn home_dir() -> Result<PathBuf, MnError> {
    dirs::home_dir()
        .ok_or_else(|| MnError::Config("Could not determine home directory".to_string()))
}
