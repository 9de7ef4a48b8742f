//! Key-value storage for sessions, bindings, counters and one-time tokens.
//!
//! Everything in this crate talks to storage through [`KeyValueStore`], a
//! minimal Redis-shaped contract: strings with optional expiry plus sets.
//! Two backends are provided:
//!
//! - [`RedisStore`]: production backend over a multiplexed connection manager
//! - [`MemoryStore`]: in-process backend with identical semantics, used by
//!   tests and single-node development
//!
//! [`SessionStore`] layers the session key namespaces on top of either one.
//!
//! ## Example
//!
//! ```no_run
//! use session_vault::store::{KeyValueStore, RedisStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisStore::connect(&StoreConfig::from_env()).await?;
//!     store.set_ex("greeting", "hello", 60).await?;
//!     assert_eq!(store.get("greeting").await?.as_deref(), Some("hello"));
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

pub mod config;
pub mod errors;
pub mod memory;
pub mod redis_store;
pub mod sessions;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use sessions::{SessionStore, BINDING_PREFIX, SESSION_PREFIX, USER_SESSIONS_PREFIX};

/// Remaining lifetime of a key, mirroring Redis `TTL` replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist (`-2`)
    Missing,
    /// Key exists without an expiry (`-1`)
    Persistent,
    /// Key expires in this many seconds
    Expires(u64),
}

impl KeyTtl {
    /// Convert a raw Redis `TTL` reply
    pub fn from_reply(reply: i64) -> Self {
        match reply {
            -2 => KeyTtl::Missing,
            n if n < 0 => KeyTtl::Persistent,
            // Redis reports 0 for a key in its final second; it is still live
            n => KeyTtl::Expires(n.max(1) as u64),
        }
    }

    /// Seconds left, if the key expires
    pub fn seconds(&self) -> Option<u64> {
        match self {
            KeyTtl::Expires(secs) => Some(*secs),
            _ => None,
        }
    }
}

/// Storage operations consumed by the session subsystem
///
/// Set operations report a structure mismatch as [`StoreError::WrongType`];
/// callers decide whether to self-heal.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a string value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a string value with no expiry
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Write a string value expiring after `ttl_secs`
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// Delete a key of any type
    async fn del(&self, key: &str) -> StoreResult<()>;

    /// Remaining lifetime of a key
    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl>;

    /// Set a new expiry; returns `false` if the key does not exist
    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;

    /// Whether a key exists
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Add a member to a set
    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Remove a member from a set
    async fn srem(&self, key: &str, member: &str) -> StoreResult<()>;

    /// All members of a set (empty if the key is missing)
    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>>;
}
