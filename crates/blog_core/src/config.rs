//! Runtime configuration for embedding the content core.
//!
//! # Responsibility
//! - Collect database, logging and list-limit settings in one struct.
//! - Load overrides from `BLOG_*` environment variables.
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed ones are errors,
//!   never silently replaced.
//! - `list_limits.default <= list_limits.max`, both non-zero.

use crate::logging::{default_log_level, normalize_level};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BLOG_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BLOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BLOG_LOG_DIR";
pub const ENV_LIST_LIMIT: &str = "BLOG_LIST_LIMIT";
pub const ENV_LIST_LIMIT_MAX: &str = "BLOG_LIST_LIMIT_MAX";

const DEFAULT_DB_FILE_NAME: &str = "blog.sqlite3";
const DEFAULT_LIST_LIMIT: u32 = 20;
const DEFAULT_LIST_LIMIT_MAX: u32 = 100;

/// Page size bounds for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub default: u32,
    pub max: u32,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default: DEFAULT_LIST_LIMIT,
            max: DEFAULT_LIST_LIMIT_MAX,
        }
    }
}

impl ListLimits {
    /// `None` and `0` map to the default; larger values clamp to `max`.
    pub fn normalize(&self, limit: Option<u32>) -> u32 {
        match limit {
            Some(0) | None => self.default,
            Some(value) if value > self.max => self.max,
            Some(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    /// Absolute directory for rolling log files; `None` disables file logs.
    pub log_dir: Option<PathBuf>,
    pub list_limits: ListLimits,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            list_limits: ListLimits::default(),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let read = |key: &'static str| {
            let value = lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty());
            if value.is_none() {
                info!("event=config_load module=config status=default key={key}");
            }
            value
        };

        let db_path = read(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from);

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).map_err(|message| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: raw,
                message,
            })?,
            None => defaults.log_level,
        };

        let log_dir = match read(ENV_LOG_DIR) {
            Some(raw) => {
                let path = PathBuf::from(&raw);
                if !path.is_absolute() {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_LOG_DIR,
                        value: raw,
                        message: "log directory must be an absolute path".to_string(),
                    });
                }
                Some(path)
            }
            None => None,
        };

        let list_limits = ListLimits {
            default: parse_limit(ENV_LIST_LIMIT, read(ENV_LIST_LIMIT))?
                .unwrap_or(defaults.list_limits.default),
            max: parse_limit(ENV_LIST_LIMIT_MAX, read(ENV_LIST_LIMIT_MAX))?
                .unwrap_or(defaults.list_limits.max),
        };
        if list_limits.default > list_limits.max {
            return Err(ConfigError::InvalidLimits(list_limits));
        }

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            list_limits,
        })
    }
}

fn parse_limit(key: &'static str, raw: Option<String>) -> Result<Option<u32>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            message: "limit must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(Some(value)),
        Err(err) => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            message: err.to_string(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
    InvalidLimits(ListLimits),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid {key} value `{value}`: {message}"),
            Self::InvalidLimits(limits) => write!(
                f,
                "list limit default {} exceeds max {}",
                limits.default, limits.max
            ),
        }
    }
}

impl Error for ConfigError {}
