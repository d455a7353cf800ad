//! Configuration Module
//!
//! Handles loading and managing server configuration from environment
//! variables, with an optional `.env` file.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which store implementation backs counters and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Shared Redis server
    Redis,
    /// Process-local map; state is lost on restart and not shared
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend `{}`", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Redis connection URL
    pub redis_url: String,
    /// Store implementation
    pub store_backend: StoreBackend,
    /// Extra attempts for idempotent store commands on transient faults
    pub store_max_retries: u32,
    /// TTL in seconds for populated cache snapshots
    pub cache_ttl: u64,
    /// Artificial delay of the product catalog in milliseconds
    pub upstream_latency_ms: u64,
    /// In-memory store sweep interval in seconds
    pub cleanup_interval: u64,
    /// Detailed server error messages are only sent in development
    pub development: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REDIS_URL` - Redis URL (default: redis://127.0.0.1:6379)
    /// - `STORE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `STORE_MAX_RETRIES` - Retry budget per store command (default: 3)
    /// - `CACHE_TTL_SECS` - Snapshot TTL in seconds (default: 20)
    /// - `UPSTREAM_LATENCY_MS` - Catalog delay in milliseconds (default: 2000)
    /// - `CLEANUP_INTERVAL` - Memory store sweep frequency in seconds (default: 1)
    /// - `APP_ENV` - `development` enables detailed errors (default: production)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            store_backend: parse_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            store_max_retries: parse_var("STORE_MAX_RETRIES").unwrap_or(defaults.store_max_retries),
            cache_ttl: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl),
            upstream_latency_ms: parse_var("UPSTREAM_LATENCY_MS")
                .unwrap_or(defaults.upstream_latency_ms),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            development: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(defaults.development),
        }
    }

    /// Catalog delay as a Duration.
    pub fn upstream_latency(&self) -> Duration {
        Duration::from_millis(self.upstream_latency_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_backend: StoreBackend::Redis,
            store_max_retries: 3,
            cache_ttl: 20,
            upstream_latency_ms: 2000,
            cleanup_interval: 1,
            development: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.store_max_retries, 3);
        assert_eq!(config.cache_ttl, 20);
        assert_eq!(config.upstream_latency(), Duration::from_secs(2));
        assert!(!config.development);
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!(" Redis ".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_config_from_env() {
        // All env mutation lives in this one test to avoid races between tests
        for name in [
            "SERVER_PORT",
            "REDIS_URL",
            "STORE_BACKEND",
            "STORE_MAX_RETRIES",
            "CACHE_TTL_SECS",
            "UPSTREAM_LATENCY_MS",
            "CLEANUP_INTERVAL",
            "APP_ENV",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cache_ttl, 20);
        assert!(!config.development);

        env::set_var("STORE_BACKEND", "memory");
        env::set_var("CACHE_TTL_SECS", "45");
        env::set_var("SERVER_PORT", "not-a-port");
        env::set_var("APP_ENV", "Development");

        let config = Config::from_env();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.cache_ttl, 45);
        assert_eq!(config.server_port, 3000);
        assert!(config.development);

        for name in ["STORE_BACKEND", "CACHE_TTL_SECS", "SERVER_PORT", "APP_ENV"] {
            env::remove_var(name);
        }
    }
}
