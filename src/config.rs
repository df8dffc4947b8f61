use std::env;
use std::net::SocketAddr;

use chrono::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://taskcal.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// `RUST_LOG` fallback: crate debug output plus per-request HTTP traces.
pub const DEFAULT_LOG_FILTER: &str = "taskcal=debug,tower_http=info";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub session_ttl: Duration,
    /// Allowed CORS origins; empty means any origin.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Reads the server configuration from the process environment.
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("DB_MAX_CONNECTIONS is invalid: {}", raw))
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let ttl_hours = match lookup("SESSION_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("SESSION_TTL_HOURS is invalid: {}", raw))
                })?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        let cors_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            session_ttl: Duration::hours(ttl_hours),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.session_ttl, Duration::hours(168));
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("SESSION_TTL_HOURS", "1"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://cal.example.com,"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.session_ttl, Duration::hours(1));
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://cal.example.com"]
        );
    }

    #[test]
    fn default_log_filter_covers_http_traces() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d == "tower_http=info"));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[("BIND_ADDR", "nope")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err =
            AppConfig::from_lookup(lookup_from(&[("DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
