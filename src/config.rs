//! Process configuration from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// User id of the bot's global owner; resolves to the top access level
    /// in every guild.
    pub owner_id: i64,
    /// Guild entries each access cache holds before evicting.
    pub access_cache_size: usize,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `DATABASE_URL` and `OWNER_ID` are required; everything else falls
    /// back to defaults. `ACCESS_CACHE_SIZE` must be positive to take
    /// effect.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            owner_id: env::var("OWNER_ID")
                .context("OWNER_ID must be set")?
                .parse()
                .context("OWNER_ID must be a numeric user id")?,
            access_cache_size: env::var("ACCESS_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&size| size > 0)
                .unwrap_or(1000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Fixed configuration for tests that never touch the environment.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            database_url: "postgres://localhost/warden_test".to_string(),
            owner_id: 1,
            access_cache_size: 16,
            log_level: "debug".to_string(),
        }
    }
}
