//! Email verification and password reset tokens.

use super::{
    errors::AuthResult,
    models::UserId,
    tokens::{ONE_TIME_TOKEN_BYTES, generate_secure_token, hash_token},
};
use crate::{config::OneTimeTokenConfig, store::KeyValueStore};
use std::sync::Arc;

/// Kind of one-time token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Consumed on first successful lookup
    EmailVerification,
    /// Re-checkable until explicitly invalidated
    PasswordReset,
}

impl TokenKind {
    /// Key prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            TokenKind::EmailVerification => "email_verify:",
            TokenKind::PasswordReset => "password_reset:",
        }
    }
}

/// Issues and redeems hashed, TTL-bound one-time tokens
#[derive(Clone)]
pub struct OneTimeTokens {
    kv: Arc<dyn KeyValueStore>,
    config: OneTimeTokenConfig,
}

impl OneTimeTokens {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: OneTimeTokenConfig) -> Self {
        Self { kv, config }
    }

    fn key(kind: TokenKind, token: &str) -> String {
        format!("{}{}", kind.prefix(), hash_token(token))
    }

    fn ttl_secs(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::EmailVerification => self.config.email_verification_ttl_secs,
            TokenKind::PasswordReset => self.config.password_reset_ttl_secs,
        }
    }

    /// Generate a token for `user_id`; only its hash is stored
    pub async fn issue(&self, user_id: &UserId, kind: TokenKind) -> AuthResult<String> {
        let token = generate_secure_token(ONE_TIME_TOKEN_BYTES);
        self.kv
            .set_ex(&Self::key(kind, &token), user_id, self.ttl_secs(kind))
            .await?;
        Ok(token)
    }

    /// Look up the user a token was issued to
    ///
    /// Email verification tokens are deleted on success; password reset
    /// tokens stay valid until [`OneTimeTokens::invalidate`].
    pub async fn consume(&self, token: &str, kind: TokenKind) -> AuthResult<Option<UserId>> {
        let key = Self::key(kind, token);
        let user_id = self.kv.get(&key).await?;

        if user_id.is_some() && kind == TokenKind::EmailVerification {
            self.kv.del(&key).await?;
        }
        Ok(user_id)
    }

    /// Delete a token
    pub async fn invalidate(&self, token: &str, kind: TokenKind) -> AuthResult<()> {
        Ok(self.kv.del(&Self::key(kind, token)).await?)
    }

    pub async fn issue_email_verification_token(&self, user_id: &UserId) -> AuthResult<String> {
        self.issue(user_id, TokenKind::EmailVerification).await
    }

    pub async fn verify_email_verification_token(&self, token: &str) -> AuthResult<Option<UserId>> {
        self.consume(token, TokenKind::EmailVerification).await
    }

    pub async fn issue_password_reset_token(&self, user_id: &UserId) -> AuthResult<String> {
        self.issue(user_id, TokenKind::PasswordReset).await
    }

    pub async fn verify_password_reset_token(&self, token: &str) -> AuthResult<Option<UserId>> {
        self.consume(token, TokenKind::PasswordReset).await
    }

    pub async fn invalidate_password_reset_token(&self, token: &str) -> AuthResult<()> {
        self.invalidate(token, TokenKind::PasswordReset).await
    }
}
