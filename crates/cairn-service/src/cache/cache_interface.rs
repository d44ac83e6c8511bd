//! Cache interface trait for abstracted caching operations.

use async_trait::async_trait;
use cairn_core::{CairnResult, HealthCheck, HealthStatus};
use shaku::Interface;
use std::sync::Arc;
use std::time::Duration;

/// Key-value cache store with per-entry expiry.
///
/// Values are JSON strings so the trait stays dyn-compatible. A store error is
/// reported as [`CairnError::Cache`](cairn_core::CairnError::Cache) and is
/// never folded into a miss.
#[async_trait]
pub trait CacheInterface: Interface + Send + Sync {
    /// Get a raw JSON value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> CairnResult<Option<String>>;

    /// Set a raw JSON value in the cache with a TTL, replacing any previous value.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CairnResult<()>;

    /// Delete a value from the cache.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> CairnResult<bool>;

    /// Round-trips to the store without touching any key.
    async fn ping(&self) -> CairnResult<()>;
}

/// Typed get/set over [`CacheInterface`].
#[async_trait]
pub trait CacheExt: CacheInterface {
    /// Get a typed value from the cache.
    async fn get<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> CairnResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(json) => {
                let value: T = serde_json::from_str(&json)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value in the cache.
    async fn set<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CairnResult<()> {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json, ttl).await
    }
}

impl<T: CacheInterface + ?Sized> CacheExt for T {}

/// Readiness probe for the cache store.
pub struct CacheHealthCheck {
    cache: Arc<dyn CacheInterface>,
}

impl CacheHealthCheck {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheInterface>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl HealthCheck for CacheHealthCheck {
    fn name(&self) -> &str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        match self.cache.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}
