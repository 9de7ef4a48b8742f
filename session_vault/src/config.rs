//! Session subsystem configuration.
//!
//! All lifetimes, thresholds, key material and cookie names live in one
//! immutable [`SessionConfig`] that is shared by `Arc` with every component.

/// Longest accepted access token lifetime (one day)
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: u32 = 24 * 60;

/// Longest accepted refresh lifetime (ten years)
pub const MAX_REFRESH_LIFETIME_DAYS: u32 = 3650;

/// Complete session subsystem configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Access token signing configuration
    pub access: AccessTokenConfig,
    /// Refresh token (and session) lifetime in days
    pub refresh_lifetime_days: u32,
    /// Password hashing configuration
    pub hasher: HasherConfig,
    /// Failed-login lockout configuration
    pub lockout: LockoutConfig,
    /// Email verification / password reset token lifetimes
    pub one_time: OneTimeTokenConfig,
    /// Multi-session cookie names
    pub cookies: CookieConfig,
}

/// Access token signing configuration
#[derive(Debug, Clone)]
pub struct AccessTokenConfig {
    /// HMAC signing secret
    pub secret: String,
    /// `iss` claim
    pub issuer: String,
    /// `aud` claim
    pub audience: String,
    /// Access token lifetime in minutes
    pub ttl_minutes: u32,
    /// Clock skew tolerated when checking expiry
    pub leeway_secs: u64,
}

/// Argon2id cost parameters and pepper
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Server-side pepper appended before hashing
    pub pepper: String,
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes (the "rounds" cost factor)
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

/// Failed-login counter configuration
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Failures that trigger a lockout
    pub max_attempts: u32,
    /// Lifetime of the failure counter while below the threshold
    pub counter_window_secs: u64,
    /// Lockout duration once the threshold is reached
    pub lockout_secs: u64,
}

/// One-time token lifetimes
#[derive(Debug, Clone)]
pub struct OneTimeTokenConfig {
    pub email_verification_ttl_secs: u64,
    pub password_reset_ttl_secs: u64,
}

/// Cookie names used by the multi-session scheme
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Prefix of per-session cookies (`session_<id>` = binding token)
    pub session_prefix: String,
    /// Cookie naming the current session
    pub active_session: String,
    /// Flag cookie set once legacy cookies have been migrated
    pub migration_flag: String,
    /// Max-age of the migration flag cookie
    pub migration_flag_max_age_secs: u64,
    /// Legacy single-session id cookie
    pub legacy_session_id: String,
    /// Legacy single-session refresh token cookie
    pub legacy_refresh_token: String,
    /// Shortest session id accepted from a cookie name
    pub min_session_id_len: usize,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            session_prefix: "session_".to_string(),
            active_session: "active_session".to_string(),
            migration_flag: "_multi_session_migrated".to_string(),
            migration_flag_max_age_secs: 365 * 24 * 60 * 60,
            legacy_session_id: "sessionId".to_string(),
            legacy_refresh_token: "refreshToken".to_string(),
            min_session_id_len: 20,
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    ///
    /// # Returns
    ///
    /// * `Result<SessionConfig, ConfigError>` - Validated configuration or error
    ///
    /// # Errors
    ///
    /// * `ConfigError::MissingRequired` - `JWT_SECRET` is not set
    /// * `ConfigError::Invalid` - A value fails validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::development();

        let secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let config = Self {
            access: AccessTokenConfig {
                secret,
                issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.access.issuer),
                audience: std::env::var("JWT_AUDIENCE").unwrap_or(defaults.access.audience),
                ttl_minutes: parse_env_or("ACCESS_TOKEN_TTL_MINUTES", defaults.access.ttl_minutes),
                leeway_secs: parse_env_or("ACCESS_TOKEN_LEEWAY_SECS", defaults.access.leeway_secs),
            },
            refresh_lifetime_days: parse_env_or(
                "REFRESH_TOKEN_TTL_DAYS",
                defaults.refresh_lifetime_days,
            ),
            hasher: HasherConfig {
                pepper: std::env::var("PASSWORD_PEPPER").unwrap_or(defaults.hasher.pepper),
                memory_kib: parse_env_or("ARGON2_MEMORY_KIB", defaults.hasher.memory_kib),
                iterations: parse_env_or("ARGON2_ITERATIONS", defaults.hasher.iterations),
                parallelism: parse_env_or("ARGON2_PARALLELISM", defaults.hasher.parallelism),
            },
            lockout: LockoutConfig {
                max_attempts: parse_env_or("LOGIN_MAX_ATTEMPTS", defaults.lockout.max_attempts),
                counter_window_secs: parse_env_or(
                    "LOGIN_COUNTER_WINDOW_SECS",
                    defaults.lockout.counter_window_secs,
                ),
                lockout_secs: parse_env_or("LOGIN_LOCKOUT_SECS", defaults.lockout.lockout_secs),
            },
            one_time: OneTimeTokenConfig {
                email_verification_ttl_secs: parse_env_or(
                    "EMAIL_VERIFICATION_TTL_SECS",
                    defaults.one_time.email_verification_ttl_secs,
                ),
                password_reset_ttl_secs: parse_env_or(
                    "PASSWORD_RESET_TTL_SECS",
                    defaults.one_time.password_reset_ttl_secs,
                ),
            },
            cookies: CookieConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Development configuration with a fixed, non-secret signing key
    pub fn development() -> Self {
        Self {
            access: AccessTokenConfig {
                secret: "development_only_secret_change_me_0123456789".to_string(),
                issuer: "session-vault".to_string(),
                audience: "session-vault-clients".to_string(),
                ttl_minutes: 15,
                leeway_secs: 0,
            },
            refresh_lifetime_days: 7,
            hasher: HasherConfig {
                pepper: String::new(),
                memory_kib: 19 * 1024,
                iterations: 2,
                parallelism: 1,
            },
            lockout: LockoutConfig {
                max_attempts: 5,
                counter_window_secs: 60 * 60,
                lockout_secs: 15 * 60,
            },
            one_time: OneTimeTokenConfig {
                email_verification_ttl_secs: 24 * 60 * 60,
                password_reset_ttl_secs: 60 * 60,
            },
            cookies: CookieConfig::default(),
        }
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access.secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if !(1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&self.access.ttl_minutes) {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_TTL_MINUTES".to_string(),
                reason: format!("Must be between 1 and {MAX_ACCESS_TOKEN_TTL_MINUTES}"),
            });
        }

        if !(1..=MAX_REFRESH_LIFETIME_DAYS).contains(&self.refresh_lifetime_days) {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_DAYS".to_string(),
                reason: format!("Must be between 1 and {MAX_REFRESH_LIFETIME_DAYS}"),
            });
        }

        if self.hasher.iterations == 0 || self.hasher.parallelism == 0 {
            return Err(ConfigError::Invalid {
                var: "ARGON2_ITERATIONS".to_string(),
                reason: "Iterations and parallelism must be greater than 0".to_string(),
            });
        }

        if self.hasher.memory_kib < 8 * self.hasher.parallelism {
            return Err(ConfigError::Invalid {
                var: "ARGON2_MEMORY_KIB".to_string(),
                reason: format!("Must be at least {} (8 x parallelism)", 8 * self.hasher.parallelism),
            });
        }

        if self.lockout.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "LOGIN_MAX_ATTEMPTS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.lockout.counter_window_secs == 0 || self.lockout.lockout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "LOGIN_LOCKOUT_SECS".to_string(),
                reason: "Counter window and lockout must be greater than 0".to_string(),
            });
        }

        if self.one_time.email_verification_ttl_secs == 0 || self.one_time.password_reset_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_RESET_TTL_SECS".to_string(),
                reason: "One-time token lifetimes must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Refresh lifetime in seconds (also the session record TTL)
    pub fn refresh_lifetime_secs(&self) -> u64 {
        u64::from(self.refresh_lifetime_days) * 24 * 60 * 60
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
