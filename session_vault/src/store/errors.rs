//! Storage error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for key-value store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key holds a different data structure than the operation expects
    #[error("WRONGTYPE: key {key} holds the wrong kind of value")]
    WrongType { key: String },

    /// Any other Redis failure
    #[error("Redis error: {0}")]
    Redis(redis::RedisError),

    /// Connection could not be established in time
    #[error("Store connection timed out after {0:?}")]
    Timeout(Duration),

    /// Value could not be encoded for storage
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Non-Redis backend failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Classify a Redis error raised while operating on `key`.
    pub fn from_redis(err: redis::RedisError, key: &str) -> Self {
        if err.code() == Some("WRONGTYPE") {
            StoreError::WrongType {
                key: key.to_string(),
            }
        } else {
            StoreError::Redis(err)
        }
    }

    /// Whether this is a structure-mismatch error eligible for self-heal
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, StoreError::WrongType { .. })
    }
}
