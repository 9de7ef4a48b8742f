//! Failed-login counting and temporary lockout.

use super::errors::GuardResult;
use crate::{
    config::LockoutConfig,
    store::{KeyTtl, KeyValueStore},
};
use std::sync::Arc;

/// Key prefix for failure counters
pub const FAILED_LOGIN_PREFIX: &str = "failed_login:";

/// Outcome of recording a failed login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLoginResult {
    /// Failures counted so far, including this one
    pub attempts: u32,
    /// Whether the identifier is now locked out
    pub is_locked: bool,
    /// Lockout length in seconds when locked
    pub lockout_remaining: Option<u64>,
}

/// Lockout check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockoutStatus {
    /// Logins are allowed
    Unlocked,

    /// Logins are blocked; remaining seconds if the store reports them
    Locked { remaining_secs: Option<u64> },
}

impl LockoutStatus {
    /// Check if logins are blocked
    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutStatus::Locked { .. })
    }

    /// Get remaining lockout seconds (if locked)
    pub fn remaining_secs(&self) -> Option<u64> {
        match self {
            LockoutStatus::Locked { remaining_secs } => *remaining_secs,
            LockoutStatus::Unlocked => None,
        }
    }
}

/// Brute-force guard keyed by login identifier (email, IP, ...)
///
/// The counter is read, incremented and written back without atomicity:
/// concurrent failures may undercount, which a throttle tolerates.
#[derive(Clone)]
pub struct LoginGuard {
    kv: Arc<dyn KeyValueStore>,
    config: LockoutConfig,
}

impl LoginGuard {
    /// Create a new login guard
    ///
    /// # Arguments
    ///
    /// * `kv` - Key-value backend
    /// * `config` - Threshold, counter window and lockout duration
    pub fn new(kv: Arc<dyn KeyValueStore>, config: LockoutConfig) -> Self {
        Self { kv, config }
    }

    fn key(identifier: &str) -> String {
        format!("{FAILED_LOGIN_PREFIX}{identifier}")
    }

    async fn attempts(&self, key: &str) -> GuardResult<u32> {
        Ok(self
            .kv
            .get(key)
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0))
    }

    /// Count a failed login
    ///
    /// Below the threshold the counter lives for the counter window, re-armed
    /// on every failure. Reaching the threshold swaps in the lockout TTL.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use session_vault::security::LoginGuard;
    /// # async fn example(guard: &LoginGuard) {
    /// let result = guard.record_failure("alice@example.com").await.unwrap();
    /// if result.is_locked {
    ///     println!("Locked for {} seconds", result.lockout_remaining.unwrap_or(0));
    /// }
    /// # }
    /// ```
    pub async fn record_failure(&self, identifier: &str) -> GuardResult<FailedLoginResult> {
        let key = Self::key(identifier);
        let attempts = self.attempts(&key).await?.saturating_add(1);

        if attempts >= self.config.max_attempts {
            self.kv
                .set_ex(&key, &attempts.to_string(), self.config.lockout_secs)
                .await?;

            log::warn!(
                "SECURITY: {} failed logins for {}; locked for {}s",
                attempts,
                identifier,
                self.config.lockout_secs
            );

            return Ok(FailedLoginResult {
                attempts,
                is_locked: true,
                lockout_remaining: Some(self.config.lockout_secs),
            });
        }

        self.kv
            .set_ex(&key, &attempts.to_string(), self.config.counter_window_secs)
            .await?;

        Ok(FailedLoginResult {
            attempts,
            is_locked: false,
            lockout_remaining: None,
        })
    }

    /// Check whether an identifier is locked out
    pub async fn is_locked_out(&self, identifier: &str) -> GuardResult<LockoutStatus> {
        let key = Self::key(identifier);
        if self.attempts(&key).await? < self.config.max_attempts {
            return Ok(LockoutStatus::Unlocked);
        }

        Ok(match self.kv.ttl(&key).await? {
            KeyTtl::Missing => LockoutStatus::Unlocked,
            KeyTtl::Persistent => LockoutStatus::Locked {
                remaining_secs: None,
            },
            KeyTtl::Expires(secs) => LockoutStatus::Locked {
                remaining_secs: Some(secs),
            },
        })
    }

    /// Reset the counter after a successful login
    pub async fn clear_failed_logins(&self, identifier: &str) -> GuardResult<()> {
        self.kv.del(&Self::key(identifier)).await?;
        Ok(())
    }
}
