//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/engagelens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/engagelens/` (~/.config/engagelens/)
//! - Data: `$XDG_DATA_HOME/engagelens/` (~/.local/share/engagelens/)
//! - State/Logs: `$XDG_STATE_HOME/engagelens/` (~/.local/state/engagelens/)

use crate::error::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics engine configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Fixed UTC offset (minutes) used for hour, weekday and date bucketing.
    /// Defaults to IST (+05:30).
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    /// Window length used when the caller does not pass one
    #[serde(default = "default_days")]
    pub default_days: u32,

    /// Number of hashtags in each top-N view
    #[serde(default = "default_top_hashtags")]
    pub top_hashtags: usize,

    /// Number of top/bottom performers reported
    #[serde(default = "default_performer_limit")]
    pub performer_limit: usize,

    /// Upper bound on records a single load may return
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Seconds a loaded snapshot may be reused (0 disables the cache)
    #[serde(default)]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached snapshots
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            default_days: default_days(),
            top_hashtags: default_top_hashtags(),
            performer_limit: default_performer_limit(),
            max_records: default_max_records(),
            cache_ttl_secs: 0,
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl AnalyticsConfig {
    /// The fixed zone all time bucketing is done in.
    pub fn timezone(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                Error::Config(format!(
                    "analytics.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.utc_offset_minutes.unsigned_abs() > 18 * 60 {
            return Err(Error::Config(
                "analytics.utc_offset_minutes must be within +/-18 hours".to_string(),
            ));
        }
        if self.default_days == 0 {
            return Err(Error::Config(
                "analytics.default_days must be at least 1".to_string(),
            ));
        }
        if self.max_records == 0 {
            return Err(Error::Config(
                "analytics.max_records must be at least 1".to_string(),
            ));
        }
        if self.cache_ttl_secs > 0 && self.cache_capacity == 0 {
            return Err(Error::Config(
                "analytics.cache_capacity must be at least 1 when caching is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_days() -> u32 {
    30
}

fn default_top_hashtags() -> usize {
    10
}

fn default_performer_limit() -> usize {
    5
}

fn default_max_records() -> usize {
    50_000
}

fn default_cache_capacity() -> usize {
    32
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,

    /// Also print warnings and errors to stderr
    #[serde(default)]
    pub stderr_warnings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
            stderr_warnings: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.analytics.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/engagelens/config.toml` (~/.config/engagelens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("engagelens").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("engagelens")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("engagelens")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/engagelens/data.db` (~/.local/share/engagelens/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }
}
