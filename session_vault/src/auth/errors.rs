//! Authentication error types.

use crate::store::StoreError;
use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Storage failure other than a self-healed one
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A configured lifetime pushes an expiry past the representable range
    #[error("Configured lifetime overflows the expiry timestamp")]
    LifetimeOverflow,

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Access token past its expiry
    #[error("Access token expired")]
    TokenExpired,

    /// Access token signature, claims or type did not check out
    #[error("Invalid access token")]
    InvalidToken,

    /// Any other signing/verification failure, surfaced unmodified
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    pub fn client_message(&self) -> String {
        match self {
            AuthError::TokenExpired | AuthError::InvalidToken => {
                "Your session has expired, please sign in again".to_string()
            }
            AuthError::Store(_)
            | AuthError::LifetimeOverflow
            | AuthError::HashingFailed
            | AuthError::Jwt(_) => "Internal server error".to_string(),
        }
    }

    /// Whether the caller should send the user back to sign-in
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::TokenExpired | AuthError::InvalidToken)
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_ask_for_sign_in() {
        for err in [AuthError::TokenExpired, AuthError::InvalidToken] {
            assert!(err.requires_reauthentication());
            assert!(err.client_message().contains("sign in again"));
        }
    }

    #[test]
    fn test_internal_errors_are_sanitized() {
        let err = AuthError::Store(StoreError::Backend("10.0.0.3:6379 refused".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.requires_reauthentication());

        assert_eq!(
            AuthError::LifetimeOverflow.client_message(),
            "Internal server error"
        );
    }
}
