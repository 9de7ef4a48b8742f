//! # Session Vault
//!
//! Session and credential lifecycle for a multi-account web application:
//! password hashing, opaque refresh tokens, Redis-backed multi-session
//! storage with per-device binding tokens, ban propagation, brute-force
//! lockout and one-time email/reset tokens.
//!
//! ## Architecture
//!
//! Components, leaf first:
//!
//! - **Credential hasher** ([`auth::CredentialHasher`]): Argon2id hashing and strength rules
//! - **Token generator** ([`auth::tokens`]): CSPRNG tokens and their SHA-256 at-rest hashes
//! - **Access token codec** ([`auth::AccessTokenCodec`]): short-lived HS256 bearer tokens
//! - **Session store** ([`store::SessionStore`]): key namespaces with TTL preservation and self-heal
//! - **Session manager** ([`auth::SessionManager`]): create, rotate, validate, ban, destroy
//! - **Cookie resolver** ([`auth::CookieResolver`]): several accounts per browser, legacy migration
//! - **Login guard** ([`security::LoginGuard`]): failure counter and lockout window
//! - **One-time tokens** ([`auth::OneTimeTokens`]): email verification and password reset
//!
//! ## Example
//!
//! ```
//! use session_vault::{SessionVault, auth::{BanState, DeviceInfo}, config::SessionConfig};
//! use session_vault::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = SessionVault::new(Arc::new(MemoryStore::new()), SessionConfig::development())?;
//! let issued = vault
//!     .sessions
//!     .issue_session(&"user-1".to_string(), &DeviceInfo::default(), &BanState::active())
//!     .await?;
//! assert!(vault.sessions.verify_access_token(&issued.access_token).is_ok());
//! # Ok(())
//! # }
//! ```

/// Credentials, tokens and the session lifecycle.
pub mod auth;

/// Subsystem configuration.
pub mod config;

/// Brute-force protection.
pub mod security;

/// Key-value storage backends and session key namespaces.
pub mod store;

use auth::{AuthResult, CookieResolver, CredentialHasher, OneTimeTokens, SessionManager};
use config::SessionConfig;
use security::LoginGuard;
use std::sync::Arc;
use store::KeyValueStore;

/// Every component wired to one store and one configuration
#[derive(Clone)]
pub struct SessionVault {
    pub config: Arc<SessionConfig>,
    pub hasher: CredentialHasher,
    pub sessions: SessionManager,
    pub cookies: CookieResolver,
    pub login_guard: LoginGuard,
    pub one_time: OneTimeTokens,
}

impl SessionVault {
    /// Build all components over a shared key-value backend
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Hasher cost parameters are out of range
    pub fn new(kv: Arc<dyn KeyValueStore>, config: SessionConfig) -> AuthResult<Self> {
        let config = Arc::new(config);
        let hasher = CredentialHasher::new(&config.hasher)?;
        let sessions = SessionManager::new(kv.clone(), config.clone());

        Ok(Self {
            hasher,
            cookies: CookieResolver::new(sessions.clone()),
            login_guard: LoginGuard::new(kv.clone(), config.lockout.clone()),
            one_time: OneTimeTokens::new(kv, config.one_time.clone()),
            sessions,
            config,
        })
    }
}
