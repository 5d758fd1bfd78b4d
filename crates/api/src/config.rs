use std::str::FromStr;

use tablebook_core::availability::{DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_COMBINED_TABLES};
use tablebook_core::booking::{utc_offset_hours, BookingPolicy, DEFAULT_UTC_OFFSET_HOURS};
use tablebook_core::reservation::DEFAULT_TABLE_TURNOVER_MINUTES;

/// A configuration variable that is set but cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to drain after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// Tunables for availability search and commits.
    pub booking: BookingPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `TABLE_TURNOVER_MINUTES`      | `150`                   |
    /// | `MAX_COMBINED_TABLES`         | `4`                     |
    /// | `MAX_CANDIDATES`              | `10`                    |
    /// | `CAPACITY_BUFFER`             | unset (no limit)        |
    /// | `RESTAURANT_UTC_OFFSET_HOURS` | `2`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;
        let shutdown_timeout_secs = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30u64)?;

        let turnover_minutes =
            parse_or(&lookup, "TABLE_TURNOVER_MINUTES", DEFAULT_TABLE_TURNOVER_MINUTES)?;
        if turnover_minutes <= 0 {
            return Err(invalid("TABLE_TURNOVER_MINUTES", turnover_minutes, "must be positive"));
        }
        let max_combined_tables =
            parse_or(&lookup, "MAX_COMBINED_TABLES", DEFAULT_MAX_COMBINED_TABLES)?;
        if max_combined_tables == 0 {
            return Err(invalid("MAX_COMBINED_TABLES", max_combined_tables, "must be at least 1"));
        }
        let max_candidates = parse_or(&lookup, "MAX_CANDIDATES", DEFAULT_MAX_CANDIDATES)?;

        let capacity_buffer = match lookup("CAPACITY_BUFFER") {
            None => None,
            Some(raw) => {
                let buffer: f64 = parse_value("CAPACITY_BUFFER", &raw)?;
                if !buffer.is_finite() || buffer < 1.0 {
                    return Err(invalid("CAPACITY_BUFFER", raw, "must be at least 1.0"));
                }
                Some(buffer)
            }
        };

        let offset_hours =
            parse_or(&lookup, "RESTAURANT_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let utc_offset = utc_offset_hours(offset_hours)
            .map_err(|e| invalid("RESTAURANT_UTC_OFFSET_HOURS", offset_hours, e))?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            booking: BookingPolicy {
                turnover_minutes,
                max_combined_tables,
                max_candidates,
                capacity_buffer,
                utc_offset,
            },
        })
    }
}

/// `DATABASE_URL`, which has no default.
pub fn database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(key, raw, e))
}

fn invalid(
    key: &'static str,
    value: impl ToString,
    reason: impl ToString,
) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
