//! # Database Configuration
//!
//! Connection pool configuration with environment variable loading.
//!
//! The data-store address is the only required option; everything else carries
//! a default tuned for a single-process deployment. Absent or malformed values
//! fail fast with a configuration error rather than falling back silently.

use crate::error::{CodevaultError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

fn default_pool_size() -> u32 {
    10
}

fn default_max_overflow() -> u32 {
    20
}

fn default_pool_timeout_secs() -> u64 {
    30
}

fn default_pool_recycle_secs() -> u64 {
    3600
}

fn default_pool_pre_ping() -> bool {
    true
}

/// Connection pool configuration for the storage layer.
///
/// Mirrors the environment keys recognized by the service:
///
/// | Key | Field | Default |
/// |-----|-------|---------|
/// | `DATABASE_URL` | `database_url` | required |
/// | `DB_POOL_SIZE` | `pool_size` | 10 |
/// | `DB_MAX_OVERFLOW` | `max_overflow` | 20 |
/// | `DB_POOL_TIMEOUT` | `pool_timeout_secs` | 30 |
/// | `DB_POOL_RECYCLE` | `pool_recycle_secs` | 3600 |
/// | `DB_POOL_PRE_PING` | `pool_pre_ping` | true |
/// | `DB_ECHO` | `echo` | false |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Number of steady-state pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Extra transient connections allowed beyond pool_size
    #[serde(default = "default_max_overflow")]
    pub max_overflow: u32,

    /// Seconds to wait for a free connection before failing
    #[serde(default = "default_pool_timeout_secs")]
    pub pool_timeout_secs: u64,

    /// Seconds after which a pooled connection is discarded and replaced
    #[serde(default = "default_pool_recycle_secs")]
    pub pool_recycle_secs: u64,

    /// Validate a connection's liveness before handing it out
    #[serde(default = "default_pool_pre_ping")]
    pub pool_pre_ping: bool,

    /// Verbose statement logging
    #[serde(default)]
    pub echo: bool,
}

impl DatabaseConfig {
    /// Create a configuration with defaults for everything but the URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_size: default_pool_size(),
            max_overflow: default_max_overflow(),
            pool_timeout_secs: default_pool_timeout_secs(),
            pool_recycle_secs: default_pool_recycle_secs(),
            pool_pre_ping: default_pool_pre_ping(),
            echo: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; its absence is a configuration error, as is
    /// any unparseable numeric or boolean override.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            CodevaultError::Configuration(
                "DATABASE_URL environment variable is required".to_string(),
            )
        })?;

        Ok(Self {
            database_url,
            pool_size: env_u32("DB_POOL_SIZE", default_pool_size())?,
            max_overflow: env_u32("DB_MAX_OVERFLOW", default_max_overflow())?,
            pool_timeout_secs: env_u64("DB_POOL_TIMEOUT", default_pool_timeout_secs())?,
            pool_recycle_secs: env_u64("DB_POOL_RECYCLE", default_pool_recycle_secs())?,
            pool_pre_ping: env_bool("DB_POOL_PRE_PING", default_pool_pre_ping())?,
            echo: env_bool("DB_ECHO", false)?,
        })
    }

    /// Ceiling on concurrent physical connections
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }

    /// Checkout wait before failure
    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    /// Connection max age before replacement
    pub fn pool_recycle(&self) -> Duration {
        Duration::from_secs(self.pool_recycle_secs)
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            CodevaultError::Configuration(format!("{key} must be a positive integer, got '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            CodevaultError::Configuration(format!("{key} must be a positive integer, got '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CodevaultError::Configuration(format!(
                "{key} must be a boolean, got '{raw}'"
            ))),
        },
        Err(_) => Ok(default),
    }
}
