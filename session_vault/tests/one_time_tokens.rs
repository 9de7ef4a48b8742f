//! Integration tests for email verification and password reset tokens.

use session_vault::{
    auth::{OneTimeTokens, TokenKind, hash_token},
    config::SessionConfig,
    store::{KeyValueStore, MemoryStore},
};
use std::sync::Arc;

fn setup() -> (Arc<MemoryStore>, OneTimeTokens) {
    let kv = Arc::new(MemoryStore::new());
    let tokens = OneTimeTokens::new(kv.clone(), SessionConfig::development().one_time);
    (kv, tokens)
}

#[tokio::test]
async fn test_email_verification_is_single_use() {
    let (_, tokens) = setup();
    let user = "alice".to_string();
    let token = tokens.issue_email_verification_token(&user).await.unwrap();

    assert_eq!(
        tokens.verify_email_verification_token(&token).await.unwrap(),
        Some(user)
    );
    assert_eq!(tokens.verify_email_verification_token(&token).await.unwrap(), None);
}

#[tokio::test]
async fn test_password_reset_is_reusable_until_invalidated() {
    let (_, tokens) = setup();
    let user = "bob".to_string();
    let token = tokens.issue_password_reset_token(&user).await.unwrap();

    for _ in 0..3 {
        assert_eq!(
            tokens.verify_password_reset_token(&token).await.unwrap(),
            Some(user.clone())
        );
    }

    tokens.invalidate_password_reset_token(&token).await.unwrap();
    assert_eq!(tokens.verify_password_reset_token(&token).await.unwrap(), None);
}

#[tokio::test]
async fn test_kinds_do_not_cross() {
    let (_, tokens) = setup();
    let user = "carol".to_string();
    let reset = tokens.issue(&user, TokenKind::PasswordReset).await.unwrap();

    assert_eq!(tokens.consume(&reset, TokenKind::EmailVerification).await.unwrap(), None);
    assert_eq!(
        tokens.consume(&reset, TokenKind::PasswordReset).await.unwrap(),
        Some(user)
    );
}

#[tokio::test]
async fn test_only_hash_is_stored_with_ttl() {
    let (kv, tokens) = setup();
    let token = tokens
        .issue_email_verification_token(&"dave".to_string())
        .await
        .unwrap();

    let key = format!("email_verify:{}", hash_token(&token));
    assert!(!kv.exists(&format!("email_verify:{token}")).await.unwrap());
    assert_eq!(kv.get(&key).await.unwrap().as_deref(), Some("dave"));

    let ttl = kv.ttl(&key).await.unwrap().seconds().unwrap();
    assert!(ttl > 0 && ttl <= 86_400);
}

#[tokio::test]
async fn test_unknown_token_resolves_nothing() {
    let (_, tokens) = setup();
    assert_eq!(tokens.verify_password_reset_token("never-issued").await.unwrap(), None);
    assert_eq!(tokens.verify_email_verification_token("").await.unwrap(), None);
}
