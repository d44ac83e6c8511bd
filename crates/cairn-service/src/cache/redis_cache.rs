//! Redis-based cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use cairn_core::{CairnError, CairnResult};
use deadpool_redis::{redis::AsyncCommands, Pool};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Redis-based cache service.
///
/// Expiry is delegated to Redis through `SET ... EX`.
#[derive(Component)]
#[shaku(interface = CacheInterface)]
pub struct RedisCacheService {
    pool: Arc<Pool>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> CairnResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| CairnError::Cache(format!("Failed to get Redis connection: {}", e)))
    }
}

/// Redis expiry has whole-second resolution; sub-second TTLs round up to one.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheInterface for RedisCacheService {
    async fn get_raw(&self, key: &str) -> CairnResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CairnError::Cache(format!("Failed to get key '{}': {}", key, e)))?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CairnResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl_secs(ttl);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| CairnError::Cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CairnResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| CairnError::Cache(format!("Failed to delete key '{}': {}", key, e)))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn ping(&self) -> CairnResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CairnError::Cache(format!("Ping failed: {}", e)))?;
        Ok(())
    }
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("RedisCacheService")
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}
