//! Error types for security module

use crate::store::StoreError;
use thiserror::Error;

/// Result type for login guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Login guard errors
#[derive(Debug, Error)]
pub enum GuardError {
    /// Storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
