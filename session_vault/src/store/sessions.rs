//! Session key namespaces over a [`KeyValueStore`].
//!
//! Layout:
//!
//! - `session:<id>`: JSON session record, TTL = remaining refresh lifetime
//! - `user_sessions:<userId>`: set of session ids, no TTL, pruned lazily
//! - `binding:<id>`: binding-token hash, TTL mirrors the session

use super::{
    KeyValueStore,
    errors::{StoreError, StoreResult},
};
use crate::auth::models::{Session, SessionId, UserId};
use std::sync::Arc;

/// Key prefix for session records
pub const SESSION_PREFIX: &str = "session:";

/// Key prefix for per-user session-id sets
pub const USER_SESSIONS_PREFIX: &str = "user_sessions:";

/// Key prefix for session binding hashes
pub const BINDING_PREFIX: &str = "binding:";

/// Session persistence primitives
#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a session store over a key-value backend
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Underlying key-value backend
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    pub fn session_key(session_id: &str) -> String {
        format!("{SESSION_PREFIX}{session_id}")
    }

    pub fn user_sessions_key(user_id: &str) -> String {
        format!("{USER_SESSIONS_PREFIX}{user_id}")
    }

    pub fn binding_key(session_id: &str) -> String {
        format!("{BINDING_PREFIX}{session_id}")
    }

    /// Load a session record
    ///
    /// A record that fails to decode is deleted and reported as absent.
    pub async fn load(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let key = Self::session_key(session_id);
        let Some(raw) = self.kv.get(&key).await? else {
            return Ok(None);
        };

        match Session::decode(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                log::warn!(
                    "Deleting undecodable session record {}: {}",
                    short_id(session_id),
                    e
                );
                self.kv.del(&key).await?;
                Ok(None)
            }
        }
    }

    /// Persist a new session record with a fresh TTL
    pub async fn insert(&self, session_id: &str, session: &Session, ttl_secs: u64) -> StoreResult<()> {
        let raw = serde_json::to_string(session)?;
        self.kv
            .set_ex(&Self::session_key(session_id), &raw, ttl_secs)
            .await
    }

    /// Rewrite a session record keeping its remaining TTL
    ///
    /// Returns `false` without writing when the key has already expired or
    /// carries no TTL to preserve.
    pub async fn save_preserving_ttl(&self, session_id: &str, session: &Session) -> StoreResult<bool> {
        let key = Self::session_key(session_id);
        let Some(ttl) = self.kv.ttl(&key).await?.seconds() else {
            return Ok(false);
        };

        let raw = serde_json::to_string(session)?;
        self.kv.set_ex(&key, &raw, ttl).await?;
        Ok(true)
    }

    /// Remaining lifetime of a session record in seconds
    pub async fn remaining_ttl(&self, session_id: &str) -> StoreResult<Option<u64>> {
        Ok(self.kv.ttl(&Self::session_key(session_id)).await?.seconds())
    }

    /// Delete a session record and its binding hash
    pub async fn remove(&self, session_id: &str) -> StoreResult<()> {
        self.kv.del(&Self::session_key(session_id)).await?;
        self.kv.del(&Self::binding_key(session_id)).await
    }

    /// Add a session id to the user's index
    pub async fn index_add(&self, user_id: &UserId, session_id: &SessionId) -> StoreResult<()> {
        let key = Self::user_sessions_key(user_id);
        match self.kv.sadd(&key, session_id).await {
            Err(StoreError::WrongType { .. }) => {
                self.heal_wrong_type(&key).await?;
                self.kv.sadd(&key, session_id).await
            }
            other => other,
        }
    }

    /// Remove a session id from the user's index
    pub async fn index_remove(&self, user_id: &UserId, session_id: &SessionId) -> StoreResult<()> {
        let key = Self::user_sessions_key(user_id);
        match self.kv.srem(&key, session_id).await {
            Err(StoreError::WrongType { .. }) => {
                self.heal_wrong_type(&key).await?;
                self.kv.srem(&key, session_id).await
            }
            other => other,
        }
    }

    /// Session ids recorded for a user (may include stale ids)
    pub async fn index_members(&self, user_id: &UserId) -> StoreResult<Vec<SessionId>> {
        let key = Self::user_sessions_key(user_id);
        match self.kv.smembers(&key).await {
            Err(StoreError::WrongType { .. }) => {
                self.heal_wrong_type(&key).await?;
                self.kv.smembers(&key).await
            }
            other => other,
        }
    }

    /// Delete the user's index
    pub async fn index_clear(&self, user_id: &UserId) -> StoreResult<()> {
        self.kv.del(&Self::user_sessions_key(user_id)).await
    }

    /// Store a binding hash with the given TTL
    pub async fn set_binding(&self, session_id: &str, binding_hash: &str, ttl_secs: u64) -> StoreResult<()> {
        self.kv
            .set_ex(&Self::binding_key(session_id), binding_hash, ttl_secs)
            .await
    }

    /// Stored binding hash, if the session uses one
    pub async fn binding(&self, session_id: &str) -> StoreResult<Option<String>> {
        self.kv.get(&Self::binding_key(session_id)).await
    }

    async fn heal_wrong_type(&self, key: &str) -> StoreResult<()> {
        log::warn!("Key {} held the wrong type; deleting before retry", key);
        self.kv.del(key).await
    }
}

/// Leading characters of a session id, safe to log
pub(crate) fn short_id(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn sample_session(user_id: &str) -> Session {
        let now = Utc::now();
        Session::new(
            user_id.to_string(),
            "ab".repeat(32),
            &Default::default(),
            &Default::default(),
            now,
            now + Duration::days(7),
        )
    }

    fn store() -> (Arc<MemoryStore>, SessionStore) {
        let kv = Arc::new(MemoryStore::new());
        (kv.clone(), SessionStore::new(kv))
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let (_, sessions) = store();
        let session = sample_session("user-1");
        sessions.insert("sid-1", &session, 3600).await.unwrap();

        let loaded = sessions.load("sid-1").await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_deleted() {
        let (kv, sessions) = store();
        kv.set_ex("session:broken", "{not json", 3600).await.unwrap();

        assert!(sessions.load("broken").await.unwrap().is_none());
        assert!(!kv.exists("session:broken").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_preserves_ttl() {
        let (kv, sessions) = store();
        let mut session = sample_session("user-1");
        sessions.insert("sid-1", &session, 120).await.unwrap();

        session.refresh_token_hash = "cd".repeat(32);
        assert!(sessions.save_preserving_ttl("sid-1", &session).await.unwrap());

        let ttl = kv.ttl("session:sid-1").await.unwrap().seconds().unwrap();
        assert!(ttl <= 120, "TTL must not be extended, got {}", ttl);
        assert_eq!(
            sessions.load("sid-1").await.unwrap().unwrap().refresh_token_hash,
            "cd".repeat(32)
        );
    }

    #[tokio::test]
    async fn test_save_skips_missing_record() {
        let (kv, sessions) = store();
        let session = sample_session("user-1");
        assert!(!sessions.save_preserving_ttl("gone", &session).await.unwrap());
        assert!(!kv.exists("session:gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_index_heals_wrong_type() {
        let (kv, sessions) = store();
        let user = "user-1".to_string();
        kv.set("user_sessions:user-1", "legacy-string").await.unwrap();

        sessions.index_add(&user, &"sid-1".to_string()).await.unwrap();
        assert_eq!(sessions.index_members(&user).await.unwrap(), vec!["sid-1"]);

        kv.set("user_sessions:user-1", "legacy-string").await.unwrap();
        assert!(sessions.index_members(&user).await.unwrap().is_empty());

        kv.set("user_sessions:user-1", "legacy-string").await.unwrap();
        sessions.index_remove(&user, &"sid-1".to_string()).await.unwrap();
        assert!(!kv.exists("user_sessions:user-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_deletes_binding() {
        let (kv, sessions) = store();
        sessions.insert("sid-1", &sample_session("u"), 60).await.unwrap();
        sessions.set_binding("sid-1", "hash", 60).await.unwrap();

        sessions.remove("sid-1").await.unwrap();
        assert!(!kv.exists("session:sid-1").await.unwrap());
        assert!(sessions.binding("sid-1").await.unwrap().is_none());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
