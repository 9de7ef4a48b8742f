//! Store connection configuration.

use std::env;

/// Redis connection configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Redis connection URL
    pub redis_url: String,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
}

impl StoreConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `REDIS_URL`: Redis connection string (default: `redis://127.0.0.1:6379`)
    /// - `REDIS_CONNECT_TIMEOUT_SECS`: Connection timeout in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::development();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            connection_timeout_secs: env::var("REDIS_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.connection_timeout_secs),
        }
    }

    /// Local development configuration
    pub fn development() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout_secs: 5,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::development()
    }
}
