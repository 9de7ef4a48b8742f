//! Redis key-value backend.

use super::{
    KeyTtl, KeyValueStore,
    config::StoreConfig,
    errors::{StoreError, StoreResult},
};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use std::time::Duration;
use tokio::time::timeout;

/// Redis-backed store
///
/// The connection manager multiplexes commands over one connection and
/// reconnects on failure; it is cheap to clone per command.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    ///
    /// # Arguments
    ///
    /// * `config` - Store configuration
    ///
    /// # Returns
    ///
    /// * `StoreResult<RedisStore>` - Connected store or error
    ///
    /// # Errors
    ///
    /// * `StoreError::Redis` - Invalid URL or connection refused
    /// * `StoreError::Timeout` - Server did not answer in time
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str()).map_err(StoreError::Redis)?;
        let limit = Duration::from_secs(config.connection_timeout_secs);

        let manager = timeout(limit, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(limit))?
            .map_err(StoreError::Redis)?;

        Ok(Self { manager })
    }

    /// Wrap an existing connection manager
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Round-trip a `PING`
    pub async fn health_check(&self) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(StoreError::Redis)?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.set(key, value)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.set_ex(key, value, ttl_secs)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.del(key)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn ttl(&self, key: &str) -> StoreResult<KeyTtl> {
        let mut conn = self.manager.clone();
        let reply: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| StoreError::from_redis(e, key))?;
        Ok(KeyTtl::from_reply(reply))
    }

    async fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        conn.expire(key, ttl_secs as i64)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut conn = self.manager.clone();
        conn.exists(key)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn sadd(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.sadd(key, member)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn srem(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.manager.clone();
        conn.srem(key, member)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }

    async fn smembers(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.manager.clone();
        conn.smembers(key)
            .await
            .map_err(|e| StoreError::from_redis(e, key))
    }
}
