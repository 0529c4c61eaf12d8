//! Runtime configuration loaded from environment variables.
//!
//! # Environment Variables
//! - `FASHIONFIT_DB_PATH` - SQLite database file (default: `fashionfit.db`)
//! - `FASHIONFIT_STORAGE_TIMEOUT_MS` - Lock wait bound in milliseconds
//!   (default: 5000, allowed: 1..=60000)
//! - `FASHIONFIT_LOG_LEVEL` - trace|debug|info|warn|error
//!   (default: build-mode dependent)
//! - `FASHIONFIT_LOG_DIR` - Absolute directory for rolling log files. File
//!   logging stays off when unset.

use crate::db::DEFAULT_STORAGE_TIMEOUT;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "FASHIONFIT_DB_PATH";
pub const ENV_STORAGE_TIMEOUT_MS: &str = "FASHIONFIT_STORAGE_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "FASHIONFIT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FASHIONFIT_LOG_DIR";

const DEFAULT_DB_PATH: &str = "fashionfit.db";
const MAX_STORAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidEnvVar { name: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEnvVar { name, reason } => {
                write!(f, "invalid environment variable {name}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub storage_timeout: Duration,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value of
    /// a variable or `None` when it is unset. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_STORAGE_TIMEOUT_MS) {
            config.storage_timeout = parse_storage_timeout(&raw)?;
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidEnvVar {
                    name: ENV_LOG_DIR,
                    reason: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }
}

fn parse_storage_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
        name: ENV_STORAGE_TIMEOUT_MS,
        reason: format!("expected milliseconds, got `{raw}`"),
    })?;
    let timeout = Duration::from_millis(millis);
    if timeout.is_zero() || timeout > MAX_STORAGE_TIMEOUT {
        return Err(ConfigError::InvalidEnvVar {
            name: ENV_STORAGE_TIMEOUT_MS,
            reason: format!(
                "must be between 1 and {} ms, got {millis}",
                MAX_STORAGE_TIMEOUT.as_millis()
            ),
        });
    }
    Ok(timeout)
}
