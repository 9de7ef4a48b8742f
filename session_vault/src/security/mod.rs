//! Brute-force protection for login endpoints.
//!
//! Failed logins are counted per identifier (email, IP, ...):
//! - **Counter window**: 1 hour, re-armed by every failure
//! - **Threshold**: 5 failures
//! - **Lockout**: 15 minutes once the threshold is reached
//!
//! A successful login clears the counter.
//!
//! ## Example
//!
//! ```no_run
//! use session_vault::config::SessionConfig;
//! use session_vault::security::LoginGuard;
//! use session_vault::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let guard = LoginGuard::new(Arc::new(MemoryStore::new()), SessionConfig::development().lockout);
//!
//!     let status = guard.is_locked_out("192.168.1.1").await?;
//!     if status.is_locked() {
//!         println!("Try again in {:?} seconds", status.remaining_secs());
//!     } else {
//!         guard.record_failure("192.168.1.1").await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod login_guard;

pub use errors::{GuardError, GuardResult};
pub use login_guard::{FAILED_LOGIN_PREFIX, FailedLoginResult, LockoutStatus, LoginGuard};
