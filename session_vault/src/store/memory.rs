//! In-process key-value backend.

use super::{
    KeyTtl, KeyValueStore,
    errors::{StoreError, StoreResult},
};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(HashSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store with Redis semantics
///
/// Expired keys are evicted lazily on access, the same way Redis treats
/// a key past its TTL as absent. Set operations against string keys (and
/// string reads against sets) fail with [`StoreError::WrongType`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Whether the store holds no live keys
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn evict_if_expired(entries: &mut HashMap<String, Entry>, key: &str) {
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            entries.remove(key);
        }
    }

    fn wrong_type(key: &str) -> StoreError {
        StoreError::WrongType {
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(Value::Set(_)) => Err(Self::wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        if ttl_secs == 0 {
            return Err(StoreError::Backend(format!(
                "invalid expire time in 'setex' command for {key}"
            )));
        }

        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(Instant::now() + Duration::from_secs(ttl_secs)),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        Ok(match entries.get(key) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => {
                let remaining = at.saturating_duration_since(Instant::now());
                KeyTtl::Expires(remaining.as_millis().div_ceil(1000).max(1) as u64)
            }
        })
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + Duration::from_secs(ttl_secs));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);
        Ok(entries.contains_key(key))
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at: None,
        });

        match &mut entry.value {
            Value::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            Value::Str(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        let now_empty = match entries.get_mut(key).map(|entry| &mut entry.value) {
            None => return Ok(()),
            Some(Value::Str(_)) => return Err(Self::wrong_type(key)),
            Some(Value::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
        };

        // Redis deletes a set once its last member is removed
        if now_empty {
            entries.remove(key);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut entries = self.entries.write().await;
        Self::evict_if_expired(&mut entries, key);

        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Value::Str(_)) => Err(Self::wrong_type(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_string_round_trip_and_delete() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.ttl("k").await.unwrap(), KeyTtl::Persistent);

        store.del("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.ttl("k").await.unwrap(), KeyTtl::Missing);
    }

    #[tokio::test]
    async fn test_set_ex_reports_remaining_ttl() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", 900).await.unwrap();

        match store.ttl("k").await.unwrap() {
            KeyTtl::Expires(secs) => assert!(secs > 890 && secs <= 900),
            other => panic!("expected expiring key, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_ex_rejects_zero_ttl() {
        let store = MemoryStore::new();
        assert!(store.set_ex("k", "v", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_keys_disappear() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.exists("k").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_clears_previous_expiry() {
        let store = MemoryStore::new();
        store.set_ex("k", "v", 60).await.unwrap();
        store.set("k", "w").await.unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), KeyTtl::Persistent);
    }

    #[tokio::test]
    async fn test_set_operations() {
        let store = MemoryStore::new();
        store.sadd("s", "a").await.unwrap();
        store.sadd("s", "b").await.unwrap();
        store.sadd("s", "a").await.unwrap();

        let mut members = store.smembers("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);

        store.srem("s", "a").await.unwrap();
        store.srem("s", "b").await.unwrap();
        assert!(!store.exists("s").await.unwrap(), "empty set is deleted");
        assert!(store.smembers("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type_errors() {
        let store = MemoryStore::new();
        store.set("str", "value").await.unwrap();
        store.sadd("set", "member").await.unwrap();

        assert!(store.sadd("str", "x").await.unwrap_err().is_wrong_type());
        assert!(store.srem("str", "x").await.unwrap_err().is_wrong_type());
        assert!(store.smembers("str").await.unwrap_err().is_wrong_type());
        assert!(store.get("set").await.unwrap_err().is_wrong_type());
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let store = MemoryStore::new();
        assert!(!store.expire("missing", 10).await.unwrap());

        store.set("k", "v").await.unwrap();
        assert!(store.expire("k", 10).await.unwrap());
        assert!(matches!(store.ttl("k").await.unwrap(), KeyTtl::Expires(_)));
    }
}
