//! Credentials, tokens and the session lifecycle.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - Opaque refresh tokens stored only as SHA-256 hashes
//! - HS256 access tokens (15-minute expiry) naming user and session
//! - Redis-backed sessions with a fixed refresh window and in-place rotation
//! - Per-device binding tokens for several signed-in accounts per browser
//! - Ban propagation across every session of a user
//! - Email verification and password reset tokens
//!
//! ## Example
//!
//! ```no_run
//! use session_vault::auth::{BanState, DeviceInfo, SessionManager};
//! use session_vault::config::SessionConfig;
//! use session_vault::store::{RedisStore, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisStore::connect(&StoreConfig::from_env()).await?;
//!     let manager = SessionManager::new(Arc::new(store), Arc::new(SessionConfig::from_env()?));
//!
//!     let device = DeviceInfo::from_user_agent(Some("Mozilla/5.0 Firefox/121.0"), None);
//!     let issued = manager
//!         .issue_session(&"user-42".to_string(), &device, &BanState::active())
//!         .await?;
//!
//!     let rotated = manager.rotate_legacy(&issued.session_id, &issued.refresh_token).await?;
//!     assert!(rotated.is_some());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cookies;
pub mod device;
pub mod errors;
pub mod manager;
pub mod models;
pub mod one_time;
pub mod password;
pub mod tokens;

pub use access::AccessTokenCodec;
pub use cookies::{
    ActiveSession, CookieChanges, CookieOp, CookieResolver, CookieSink, MigrationOutcome,
    SessionCookie, resolve_binding,
};
pub use device::{DeviceType, extract_bearer_token};
pub use errors::{AuthError, AuthResult};
pub use manager::SessionManager;
pub use models::{
    AccessTokenClaims, BanState, BindingGrant, DeviceInfo, IssuedSession, RotatedTokens, Session,
    SessionEntry, SessionId, UserId,
};
pub use one_time::{OneTimeTokens, TokenKind};
pub use password::{CredentialHasher, PasswordStrength, validate_password_strength};
pub use tokens::{generate_secure_token, hash_token};
