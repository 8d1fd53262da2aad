//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use domain::RetryPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `ORDER_MAX_ATTEMPTS`: commit attempts per request (default: `3`, at least 1)
/// - `ORDER_RETRY_BACKOFF_MS`: delay before the first retry (default: `10`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub order_max_attempts: u32,
    pub order_retry_backoff_ms: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            order_max_attempts: parse_var(&lookup, "ORDER_MAX_ATTEMPTS")
                .map(|attempts: u32| attempts.max(1))
                .unwrap_or(defaults.order_max_attempts),
            order_retry_backoff_ms: parse_var(&lookup, "ORDER_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.order_retry_backoff_ms),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Retry policy for conflicting order commits.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.order_max_attempts,
            Duration::from_millis(self.order_retry_backoff_ms),
        )
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            order_max_attempts: 3,
            order_retry_backoff_ms: 10,
        }
    }
}
