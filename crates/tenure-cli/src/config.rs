//! Configuration management for tenure.
//!
//! Configuration is one TOML file, `tenure.toml` by default, overridable
//! with `--config` or `TENURE_CONFIG`. The directory bearer token is read
//! from the environment variable the file names, never from the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tenure::ManagerConfig;
use tenure_core::{CoreError, GroupCatalog};
use thiserror::Error;

/// Errors that make the configuration unusable. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("environment variable {0} is not set")]
    MissingToken(String),

    #[error(transparent)]
    Catalog(#[from] CoreError),
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Member directory; required.
    pub directory: Option<DirectoryConfig>,

    #[serde(default)]
    pub audit: AuditConfig,

    /// Group id -> definition.
    #[serde(default)]
    pub groups: GroupCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,

    #[serde(default = "default_reminder_window")]
    pub reminder_window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the member directory API
    #[serde(default)]
    pub base_url: String,

    /// Name of the environment variable holding the bearer token
    #[serde(default)]
    pub token_env: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Webhook receiving `{"content": ...}` posts; absent means log-only.
    pub webhook_url: Option<String>,
}

// Default value functions
fn default_backend() -> Backend {
    Backend::Sqlite
}

fn default_store_path() -> PathBuf {
    PathBuf::from("tenure.db")
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_startup_delay() -> u64 {
    10
}

fn default_reminder_window() -> u64 {
    86_400
}

fn default_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            startup_delay_secs: default_startup_delay(),
            reminder_window_secs: default_reminder_window(),
        }
    }
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let directory = self.directory()?;
        if directory.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("directory.base_url"));
        }
        if directory.token_env.trim().is_empty() {
            return Err(ConfigError::Missing("directory.token_env"));
        }
        if self.schedule.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "schedule.sweep_interval_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Missing("store.path"));
        }
        self.groups.validate()?;
        Ok(())
    }

    /// The directory section.
    pub fn directory(&self) -> Result<&DirectoryConfig, ConfigError> {
        self.directory
            .as_ref()
            .ok_or(ConfigError::Missing("directory"))
    }

    /// Read the directory bearer token from the environment.
    pub fn directory_token(&self) -> Result<String, ConfigError> {
        let name = &self.directory()?.token_env;
        match std::env::var(name) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken(name.clone())),
        }
    }

    /// Timing knobs for the manager.
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig::default()
            .with_reminder_window(Duration::from_secs(self.schedule.reminder_window_secs))
            .with_sweep_interval(Duration::from_secs(self.schedule.sweep_interval_secs))
            .with_startup_delay(Duration::from_secs(self.schedule.startup_delay_secs))
    }
}
