//! Configuration management for drivelog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::app::{AppSettings, DEFAULT_EMAIL_SUBJECT};
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "drivelog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "drivelog.db";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "DRIVELOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (`DRIVELOG_`, sections split on `__`)
/// 2. TOML config file at `~/.config/drivelog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Timer configuration.
    pub timer: TimerConfig,
    /// Export configuration.
    pub export: ExportConfig,
    /// Email configuration.
    pub email: EmailConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/drivelog/drivelog.db`
    pub database_path: Option<PathBuf>,
    /// Key the log blob is stored under.
    pub storage_key: String,
}

/// Timer-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Interval between display ticks in milliseconds.
    pub tick_interval_ms: u64,
}

/// Export-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exports are saved into.
    /// Defaults to `~/.local/share/drivelog/exports`
    pub directory: Option<PathBuf>,
    /// Program (and arguments) to share exports with. The file path is
    /// appended. When unset, exports are only saved.
    pub share_command: Option<Vec<String>>,
}

/// Email-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Subject used when none is given.
    pub default_subject: String,
    /// Directory mail drafts are written into.
    /// Defaults to `~/.local/share/drivelog/drafts`
    pub drafts_directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            storage_key: "vehicleLogs".to_string(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            default_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            drafts_directory: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::figment(config_file).extract::<Self>()?.validated()
    }

    fn figment(config_file: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.timer.tick_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "tick_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.storage.storage_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage_key must not be empty".to_string(),
            });
        }

        if let Some(command) = &self.export.share_command {
            let program = command.first().map_or("", |p| p.trim());
            if program.is_empty() {
                return Err(Error::ConfigValidation {
                    message: "share_command must name a program".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("exports"))
    }

    /// Get the mail drafts directory, resolving defaults if not set.
    #[must_use]
    pub fn drafts_dir(&self) -> PathBuf {
        self.email
            .drafts_directory
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("drafts"))
    }

    /// Get the tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timer.tick_interval_ms)
    }

    /// Settings for [`App`](crate::App).
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            storage_key: self.storage.storage_key.clone(),
            tick_interval: self.tick_interval(),
            default_subject: self.email.default_subject.clone(),
        }
    }
}
