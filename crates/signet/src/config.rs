//! Environment-variable configuration.
//!
//! `DB_URL` and `SERVER_ROLE` are required; slaves additionally need
//! `MASTER_URL`. Everything else has a default. Missing or malformed
//! values are fatal at startup and never at runtime.

use signet_server::Role;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors, all fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// A variable is set to something unusable.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string.
    pub db_url: String,
    /// Replication role.
    pub role: Role,
    /// The master's `/zone-sync` URL (slaves only).
    pub master_url: Option<String>,
    /// DNS listen address (UDP and TCP).
    pub dns_listen: SocketAddr,
    /// HTTP API listen address.
    pub http_listen: SocketAddr,
    /// Root of the per-zone secrets directories.
    pub secrets_dir: PathBuf,
    /// Interval between slave sync cycles.
    pub sync_interval: Duration,
    /// Whether empty RRsets are memoized in the cache.
    pub cache_negative: bool,
    /// Log output format: `text` or `json`.
    pub log_json: bool,
}

impl Config {
    /// Reads configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_url = require("DB_URL")?;

        let role: Role = require("SERVER_ROLE")?
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                name: "SERVER_ROLE",
                reason,
            })?;

        let master_url = optional("MASTER_URL");
        if role == Role::Slave && master_url.is_none() {
            return Err(ConfigError::Missing("MASTER_URL"));
        }

        Ok(Self {
            db_url,
            role,
            master_url,
            dns_listen: parse_or("SIGNET_DNS_LISTEN", "0.0.0.0:53")?,
            http_listen: parse_or("SIGNET_HTTP_LISTEN", "0.0.0.0:8080")?,
            secrets_dir: PathBuf::from(
                optional("SIGNET_SECRETS_DIR").unwrap_or_else(|| "secrets".to_string()),
            ),
            sync_interval: Duration::from_secs(parse_or("SIGNET_SYNC_INTERVAL_SECS", "300")?),
            cache_negative: parse_or("SIGNET_CACHE_NEGATIVE", "true")?,
            log_json: optional("SIGNET_LOG_FORMAT").as_deref() == Some("json"),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or<T>(name: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = optional(name).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        reason: err.to_string(),
    })
}
