//! Integration tests for the session lifecycle.
//!
//! Covers rotation, lazy expiry, ban propagation, mass logout and storage
//! self-heal, all against the in-memory store.

use chrono::{Duration, Utc};
use session_vault::{
    SessionVault,
    auth::{BanState, DeviceInfo, IssuedSession, generate_secure_token, hash_token},
    config::SessionConfig,
    store::{KeyValueStore, MemoryStore},
};
use std::sync::Arc;

fn setup() -> (Arc<MemoryStore>, SessionVault) {
    let kv = Arc::new(MemoryStore::new());
    let vault = SessionVault::new(kv.clone(), SessionConfig::development())
        .expect("Failed to build session vault");
    (kv, vault)
}

async fn open_session(vault: &SessionVault, user_id: &str) -> IssuedSession {
    let device = DeviceInfo::from_user_agent(Some("Mozilla/5.0 Firefox/121.0"), Some("127.0.0.1"));
    vault
        .sessions
        .issue_session(&user_id.to_string(), &device, &BanState::active())
        .await
        .expect("Failed to issue session")
}

#[tokio::test]
async fn test_rotation_invalidates_previous_refresh_token() {
    let (_, vault) = setup();
    let issued = open_session(&vault, "alice").await;

    let rotated = vault
        .sessions
        .rotate_legacy(&issued.session_id, &issued.refresh_token)
        .await
        .unwrap()
        .expect("Rotation with the current token should succeed");

    assert!(
        vault
            .sessions
            .validate_refresh_token(&issued.session_id, &issued.refresh_token)
            .await
            .unwrap()
            .is_none(),
        "Old refresh token must stop working"
    );
    assert!(
        vault
            .sessions
            .validate_refresh_token(&issued.session_id, &rotated.refresh_token)
            .await
            .unwrap()
            .is_some(),
        "New refresh token must work"
    );
}

#[tokio::test]
async fn test_two_rotations_invalidate_all_earlier_tokens() {
    let (_, vault) = setup();
    let issued = open_session(&vault, "alice").await;

    let first = vault
        .sessions
        .rotate_legacy(&issued.session_id, &issued.refresh_token)
        .await
        .unwrap()
        .unwrap();
    let second = vault
        .sessions
        .rotate_legacy(&issued.session_id, &first.refresh_token)
        .await
        .unwrap()
        .unwrap();

    for stale in [&issued.refresh_token, &first.refresh_token] {
        assert!(
            vault
                .sessions
                .rotate_legacy(&issued.session_id, stale)
                .await
                .unwrap()
                .is_none()
        );
    }
    assert!(
        vault
            .sessions
            .validate_refresh_token(&issued.session_id, &second.refresh_token)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_rotation_does_not_extend_ttl() {
    let (kv, vault) = setup();
    let issued = open_session(&vault, "alice").await;
    let key = format!("session:{}", issued.session_id);

    // Pretend most of the refresh window has passed
    kv.expire(&key, 120).await.unwrap();

    vault
        .sessions
        .rotate_bound(&issued.session_id)
        .await
        .unwrap()
        .unwrap();

    let ttl = kv.ttl(&key).await.unwrap().seconds().unwrap();
    assert!(ttl <= 120, "Rotation must preserve the remaining TTL, got {}", ttl);
}

#[tokio::test]
async fn test_expired_session_is_destroyed_on_validation() {
    let (kv, vault) = setup();
    let issued = open_session(&vault, "alice").await;

    let mut session = vault
        .sessions
        .get_session(&issued.session_id)
        .await
        .unwrap()
        .unwrap();
    session.expires_at = Utc::now() - Duration::seconds(1);
    vault
        .sessions
        .store()
        .save_preserving_ttl(&issued.session_id, &session)
        .await
        .unwrap();

    assert!(
        vault
            .sessions
            .validate_refresh_token(&issued.session_id, &issued.refresh_token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(vault.sessions.get_session(&issued.session_id).await.unwrap().is_none());
    assert!(!kv.exists(&format!("binding:{}", issued.session_id)).await.unwrap());
    assert!(
        vault
            .sessions
            .list_user_sessions(&"alice".to_string())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_ban_propagation_blocks_rotation_everywhere() {
    let (_, vault) = setup();
    let laptop = open_session(&vault, "mallory").await;
    let phone = open_session(&vault, "mallory").await;
    let bystander = open_session(&vault, "bob").await;

    let updated = vault
        .sessions
        .propagate_ban(&"mallory".to_string(), true, Some("Terms of service violation"))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    for issued in [&laptop, &phone] {
        assert!(
            vault
                .sessions
                .rotate_legacy(&issued.session_id, &issued.refresh_token)
                .await
                .unwrap()
                .is_none(),
            "Banned session must refuse rotation even with a valid token"
        );
        assert!(vault.sessions.rotate_bound(&issued.session_id).await.unwrap().is_none());

        let session = vault
            .sessions
            .validate_refresh_token(&issued.session_id, &issued.refresh_token)
            .await
            .unwrap()
            .expect("Banned sessions are still reported to the caller");
        assert!(session.is_banned);
        assert_eq!(session.ban_reason.as_deref(), Some("Terms of service violation"));
    }

    assert!(
        vault
            .sessions
            .rotate_bound(&bystander.session_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_unban_restores_rotation() {
    let (_, vault) = setup();
    let issued = open_session(&vault, "mallory").await;
    let user = "mallory".to_string();

    vault.sessions.propagate_ban(&user, true, None).await.unwrap();
    vault.sessions.propagate_ban(&user, false, None).await.unwrap();

    let session = vault.sessions.get_session(&issued.session_id).await.unwrap().unwrap();
    assert!(!session.is_banned);
    assert!(session.ban_reason.is_none());
    assert!(
        vault
            .sessions
            .rotate_legacy(&issued.session_id, &issued.refresh_token)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_destroy_all_counts_stale_ids() {
    let (kv, vault) = setup();
    let user = "alice".to_string();
    let a = open_session(&vault, "alice").await;
    let b = open_session(&vault, "alice").await;

    // A stale index entry whose session already expired
    kv.sadd("user_sessions:alice", "0123456789abcdef0123456789abcdef")
        .await
        .unwrap();

    assert_eq!(vault.sessions.destroy_all_sessions(&user).await.unwrap(), 3);
    assert!(vault.sessions.get_session(&a.session_id).await.unwrap().is_none());
    assert!(vault.sessions.get_session(&b.session_id).await.unwrap().is_none());
    assert!(!kv.exists("user_sessions:alice").await.unwrap());
    assert!(!kv.exists(&format!("binding:{}", a.session_id)).await.unwrap());
}

#[tokio::test]
async fn test_wrong_type_index_self_heals_on_create() {
    let (kv, vault) = setup();
    kv.set("user_sessions:alice", "corrupted").await.unwrap();

    let issued = open_session(&vault, "alice").await;

    let members = kv.smembers("user_sessions:alice").await.unwrap();
    assert_eq!(members, vec![issued.session_id]);
}

#[tokio::test]
async fn test_wrong_type_index_self_heals_on_destroy_all() {
    let (kv, vault) = setup();
    kv.set("user_sessions:alice", "corrupted").await.unwrap();

    assert_eq!(
        vault
            .sessions
            .destroy_all_sessions(&"alice".to_string())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_corrupt_record_reads_as_missing() {
    let (kv, vault) = setup();
    let issued = open_session(&vault, "alice").await;
    let key = format!("session:{}", issued.session_id);
    kv.set_ex(&key, "\u{0}garbage", 600).await.unwrap();

    assert!(
        vault
            .sessions
            .rotate_legacy(&issued.session_id, &issued.refresh_token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(!kv.exists(&key).await.unwrap(), "Corrupt record is deleted");
}

#[tokio::test]
async fn test_list_prunes_stale_index_members() {
    let (kv, vault) = setup();
    let user = "alice".to_string();
    let live = open_session(&vault, "alice").await;
    let gone = open_session(&vault, "alice").await;
    kv.del(&format!("session:{}", gone.session_id)).await.unwrap();

    let listed = vault.sessions.list_user_sessions(&user).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].session_id, live.session_id);
    assert_eq!(
        kv.smembers("user_sessions:alice").await.unwrap(),
        vec![live.session_id.clone()]
    );
}

#[tokio::test]
async fn test_touch_updates_activity_only() {
    let (kv, vault) = setup();
    let issued = open_session(&vault, "alice").await;
    let key = format!("session:{}", issued.session_id);
    kv.expire(&key, 300).await.unwrap();
    let before = vault.sessions.get_session(&issued.session_id).await.unwrap().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    vault.sessions.touch_session(&issued.session_id).await.unwrap();

    let after = vault.sessions.get_session(&issued.session_id).await.unwrap().unwrap();
    assert!(after.last_active_at > before.last_active_at);
    assert_eq!(after.refresh_token_hash, before.refresh_token_hash);
    assert!(kv.ttl(&key).await.unwrap().seconds().unwrap() <= 300);
}

#[tokio::test]
async fn test_interleaved_rotation_writes_last_write_wins() {
    let (_, vault) = setup();
    let issued = open_session(&vault, "alice").await;
    let store = vault.sessions.store();

    // Two rotations both read before either writes
    let mut first = store.load(&issued.session_id).await.unwrap().unwrap();
    let mut second = store.load(&issued.session_id).await.unwrap().unwrap();

    let first_token = generate_secure_token(32);
    let second_token = generate_secure_token(32);
    first.refresh_token_hash = hash_token(&first_token);
    second.refresh_token_hash = hash_token(&second_token);

    assert!(store.save_preserving_ttl(&issued.session_id, &first).await.unwrap());
    assert!(store.save_preserving_ttl(&issued.session_id, &second).await.unwrap());

    let survivors: Vec<bool> = {
        let mut out = Vec::new();
        for token in [&first_token, &second_token, &issued.refresh_token] {
            let session = vault
                .sessions
                .validate_refresh_token(&issued.session_id, token)
                .await
                .unwrap();
            out.push(session.is_some());
        }
        out
    };
    assert_eq!(survivors, vec![false, true, false], "Only the later write survives");
}

#[tokio::test]
async fn test_access_token_round_trip() {
    let (_, vault) = setup();
    let issued = open_session(&vault, "alice").await;

    let claims = vault.sessions.verify_access_token(&issued.access_token).unwrap();
    assert_eq!(claims.user_id, "alice");
    assert_eq!(claims.session_id, issued.session_id);
    assert_eq!(claims.token_type, "access");
}
