//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/curio` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `DB_MIN_CONNECTIONS` | `1` |
//! | `DB_CONNECT_TIMEOUT_SECS` | `10` |
//! | `ALLOWED_ORIGINS` | `http://localhost:5173` |
//! | `CURIO_TRUST_ACTOR_HEADERS` | `false` |
//! | `MAX_BODY_BYTES` | `1048576` |

use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use tracing::warn;

use curio_core::defaults::{
    DEFAULT_ALLOWED_ORIGINS, DEFAULT_HOST, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT,
};
use curio_core::{Error, Result};
use curio_db::PoolConfig;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/curio";

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool: PoolConfig,
    pub allowed_origins: Vec<HeaderValue>,
    /// Map `X-Curio-User-Id` / `X-Curio-Admin` headers to an actor.
    /// Only safe behind a proxy that sets and strips them.
    pub trust_actor_headers: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            pool: PoolConfig::default(),
            allowed_origins: parse_allowed_origins(DEFAULT_ALLOWED_ORIGINS),
            trust_actor_headers: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults.
    ///
    /// Present but unparsable numeric values are errors rather than being
    /// silently replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut pool = defaults.pool.clone();
        if let Some(n) = parse_var(&lookup, "DB_MAX_CONNECTIONS")? {
            pool = pool.max_connections(n);
        }
        if let Some(n) = parse_var(&lookup, "DB_MIN_CONNECTIONS")? {
            pool = pool.min_connections(n);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DB_CONNECT_TIMEOUT_SECS")? {
            pool = pool.connect_timeout(Duration::from_secs(secs));
        }

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(raw) => parse_allowed_origins(&raw),
            None => defaults.allowed_origins,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            pool,
            allowed_origins,
            trust_actor_headers: lookup("CURIO_TRUST_ACTOR_HEADERS")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
        })
    }

    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", key, raw))),
        _ => Ok(None),
    }
}

/// `true`, `1` and `yes` (any case) enable a flag.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Parse a comma-separated CORS origin list.
///
/// Blank input falls back to the default origin; entries that are not valid
/// header values are skipped with a warning.
pub fn parse_allowed_origins(origins: &str) -> Vec<HeaderValue> {
    if origins.trim().is_empty() {
        return vec![HeaderValue::from_static(DEFAULT_ALLOWED_ORIGINS)];
    }

    origins
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
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
    fn test_defaults_when_environment_empty() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert!(!config.trust_actor_headers);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(config.allowed_origins.len(), 1);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/curio"),
            ("PORT", "8080"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_CONNECT_TIMEOUT_SECS", "3"),
            ("CURIO_TRUST_ACTOR_HEADERS", "TRUE"),
            ("MAX_BODY_BYTES", "4096"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db/curio");
        assert_eq!(config.port, 8080);
        assert_eq!(config.pool.max_connections, 25);
        assert_eq!(config.pool.connect_timeout, Duration::from_secs(3));
        assert!(config.trust_actor_headers);
        assert_eq!(config.max_body_bytes, 4096);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_allowed_origins_parsing() {
        let origins = parse_allowed_origins("https://curio.example, http://localhost:3000 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0].to_str().unwrap(), "https://curio.example");
        assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");

        let origins = parse_allowed_origins("   ");
        assert_eq!(origins[0].to_str().unwrap(), DEFAULT_ALLOWED_ORIGINS);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" yes "));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }
}
