//! Operator CLI configuration.
//!
//! Consolidates the library's environment configuration with CLI overrides.

use session_vault::{
    config::{ConfigError, SessionConfig},
    store::StoreConfig,
};

/// Complete CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Session subsystem configuration
    pub session: SessionConfig,
    /// Redis connection configuration
    pub store: StoreConfig,
}

impl AdminConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `redis_url_override` - Optional Redis URL (from `--redis-url`)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(redis_url_override: Option<String>) -> Result<Self, ConfigError> {
        let session = SessionConfig::from_env()?;

        let mut store = StoreConfig::from_env();
        if let Some(url) = redis_url_override {
            store.redis_url = url;
        }

        let config = Self { session, store };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.store.redis_url.starts_with("redis://")
            && !self.store.redis_url.starts_with("rediss://")
        {
            return Err(ConfigError::Invalid {
                var: "REDIS_URL".to_string(),
                reason: "Must start with redis:// or rediss://".to_string(),
            });
        }

        if self.store.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "REDIS_CONNECT_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.session.validate()
    }
}
