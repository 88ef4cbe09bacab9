use std::{env, time::Duration};

/// Runtime configuration loaded from environment variables.
///
/// Unparsable values fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to SQLite database file (default: "dbhandler.db")
    pub database_path: String,
    /// Cache TTL in seconds, 0 disables expiry (default: 86400)
    pub cache_ttl_seconds: u64,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Delay between attempts of the `get_until_timeout` calls (default: 100)
    pub poll_interval_ms: u64,
    /// Redis connection URL. Only used when the `redis` feature is enabled.
    pub redis_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_PATH` - SQLite database path (default: "dbhandler.db")
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 86400)
    /// - `CACHE_MAX_ENTRIES` - Maximum in-memory cache entries (default: 10,000)
    /// - `POLL_INTERVAL_MS` - Poll delay in milliseconds (default: 100)
    /// - `REDIS_URL` - Redis connection URL (default: unset, in-memory cache)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::defaults();

        Self {
            database_path: lookup("DATABASE_PATH")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.database_path),
            cache_ttl_seconds: lookup("CACHE_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_seconds),
            cache_max_entries: lookup("CACHE_MAX_ENTRIES")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.cache_max_entries),
            poll_interval_ms: lookup("POLL_INTERVAL_MS")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.poll_interval_ms),
            redis_url: lookup("REDIS_URL").filter(|v| !v.is_empty()),
        }
    }

    fn defaults() -> Self {
        Self {
            database_path: "dbhandler.db".to_string(),
            cache_ttl_seconds: 86_400,
            cache_max_entries: 10_000,
            poll_interval_ms: 100,
            redis_url: None,
        }
    }

    /// Get cache TTL as a Duration. `None` means slots never expire.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_seconds > 0).then(|| Duration::from_secs(self.cache_ttl_seconds))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.database_path, "dbhandler.db");
        assert_eq!(config.cache_ttl_seconds, 86_400);
        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.redis_url, None);
    }

    #[test]
    fn test_values_from_variables() {
        let config = config_from(&[
            ("DATABASE_PATH", "/var/lib/voip/db.sqlite"),
            ("CACHE_TTL_SECONDS", "600"),
            ("CACHE_MAX_ENTRIES", "50"),
            ("POLL_INTERVAL_MS", "250"),
            ("REDIS_URL", "redis://cache:6379"),
        ]);

        assert_eq!(config.database_path, "/var/lib/voip/db.sqlite");
        assert_eq!(config.cache_ttl(), Some(Duration::from_secs(600)));
        assert_eq!(config.cache_max_entries, 50);
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("CACHE_TTL_SECONDS", "forever"),
            ("CACHE_MAX_ENTRIES", "0"),
            ("POLL_INTERVAL_MS", "-5"),
        ]);

        assert_eq!(config.cache_ttl_seconds, 86_400);
        assert_eq!(config.cache_max_entries, 10_000);
        assert_eq!(config.poll_interval_ms, 100);
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = config_from(&[("CACHE_TTL_SECONDS", "0")]);

        assert_eq!(config.cache_ttl(), None);
    }
}
