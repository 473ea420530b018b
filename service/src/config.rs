//! Service configuration.
//!
//! Loaded from `--config`, else `RESIDENCE_CONFIG`, else
//! `<config_dir>/residence/service.toml`. A missing file at one of the
//! default locations yields [`ServiceConfig::default`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use thiserror::Error;

/// Format of `scheduler.reconcile_at`.
pub const RECONCILE_AT_FORMAT: &str = "%H:%M";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Root configuration for the service process.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path to the SQLite database. `~/` is expanded.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_db_path() -> String {
    dirs::data_dir()
        .map(|d| {
            d.join("residence")
                .join("residence.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "residence.db".to_string())
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_filter: default_log_filter(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Daily reconciliation trigger.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Run the scheduler loop at all. With `false` the service only serves
    /// manual `--reconcile-now` runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Local time of day (`HH:MM`) after which the day is reconciled.
    #[serde(default = "default_reconcile_at")]
    pub reconcile_at: String,

    /// Seconds between clock checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_reconcile_at() -> String {
    "23:00".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            reconcile_at: default_reconcile_at(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn reconcile_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.reconcile_at, RECONCILE_AT_FORMAT).map_err(|e| {
            ConfigError::Invalid {
                field: "scheduler.reconcile_at",
                message: format!("expected HH:MM, got {:?} ({e})", self.reconcile_at),
            }
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ServiceConfig {
    /// Environment variable that overrides the config path.
    pub const ENV_CONFIG_PATH: &'static str = "RESIDENCE_CONFIG";

    pub const DEFAULT_CONFIG_FILENAME: &'static str = "service.toml";

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the env var or the default
    /// location is tried, and a missing file there means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let path = config_path_from(
            std::env::var_os(Self::ENV_CONFIG_PATH),
            dirs::config_dir(),
        );
        if !path.exists() {
            tracing::info!(path = %path.display(), "Service config not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let cfg: ServiceConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "db_path",
                message: "must not be empty".to_string(),
            });
        }
        self.scheduler.reconcile_time()?;
        if self.scheduler.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "scheduler.poll_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Database path with `~/` expanded.
    pub fn resolved_db_path(&self) -> PathBuf {
        let path = &self.db_path;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }
}

fn config_path_from(env_value: Option<OsString>, config_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = env_value.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    config_dir
        .map(|d| d.join("residence").join(ServiceConfig::DEFAULT_CONFIG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(ServiceConfig::DEFAULT_CONFIG_FILENAME))
}
