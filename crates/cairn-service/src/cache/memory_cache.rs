//! In-memory cache implementation.

use super::CacheInterface;
use async_trait::async_trait;
use cairn_core::{CairnError, CairnResult};
use dashmap::DashMap;
use shaku::Component;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Every this many writes, `set_raw` sweeps all expired entries.
const SWEEP_EVERY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-local cache store.
///
/// Expired entries are never returned. They are dropped when read, and
/// every 256 writes all of them are purged at once, so keys that
/// are never read again do not accumulate. Expiry is measured on the tokio
/// clock.
#[derive(Component, Default)]
#[shaku(interface = CacheInterface)]
pub struct InMemoryCacheService {
    entries: DashMap<String, Entry>,
    writes: AtomicUsize,
}

impl InMemoryCacheService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCacheService {
    async fn get_raw(&self, key: &str) -> CairnResult<Option<String>> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .and_then(|entry| entry.is_live(now).then(|| entry.value.clone()));

        if live.is_none() {
            // The read guard above is released, so removal cannot deadlock.
            if self.entries.remove_if(key, |_, entry| !entry.is_live(now)).is_some() {
                debug!("Evicted expired key '{}'", key);
            }
            debug!("Cache miss for key '{}'", key);
        } else {
            debug!("Cache hit for key '{}'", key);
        }

        Ok(live)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> CairnResult<()> {
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            CairnError::cache(format!("TTL of {}s for key '{}' is out of range", ttl.as_secs(), key))
        })?;

        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        debug!("Cached key '{}' with TTL {}s", key, ttl.as_secs());

        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = self.entries.len(), "Swept expired cache entries");
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CairnResult<bool> {
        let deleted = self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(Instant::now()));
        debug!("Deleted key '{}': {}", key, deleted);
        Ok(deleted)
    }

    async fn ping(&self) -> CairnResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheService")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheExt;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn test_set_then_get() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("users", "[]", MINUTE).await.unwrap();

        assert_eq!(cache.get_raw("users").await.unwrap().as_deref(), Some("[]"));
        assert!(cache.get_raw("user_ids").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_exactly_at_ttl() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("users", "[]", MINUTE).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get_raw("users").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_raw("users").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("user_1", "\"a\"", MINUTE).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        cache.set_raw("user_1", "\"b\"", MINUTE).await.unwrap();

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(cache.get_raw("user_1").await.unwrap().as_deref(), Some("\"b\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_reports_live_entries_only() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("users", "[]", MINUTE).await.unwrap();
        cache.set_raw("user_ids", "[]", MINUTE).await.unwrap();

        assert!(cache.delete("users").await.unwrap());
        assert!(!cache.delete("users").await.unwrap());

        tokio::time::advance(MINUTE).await;
        assert!(!cache.delete("user_ids").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("users", "[]", MINUTE).await.unwrap();
        cache.set_raw("user_1", "{}", Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(MINUTE).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_keys_that_are_never_read_again() {
        let cache = InMemoryCacheService::new();
        for id in 1..SWEEP_EVERY {
            cache
                .set_raw(&format!("user_{id}"), "{}", Duration::from_secs(1))
                .await
                .unwrap();
        }

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.len(), SWEEP_EVERY - 1);

        cache.set_raw("users", "[]", MINUTE).await.unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_raw("users").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_a_cache_error() {
        let cache = InMemoryCacheService::new();

        let err = cache.set_raw("users", "[]", Duration::MAX).await.unwrap_err();
        assert!(matches!(err, CairnError::Cache(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_typed_round_trip_through_ext() {
        let cache = InMemoryCacheService::new();
        cache.set("user_ids", &vec![1_i64, 2, 3], MINUTE).await.unwrap();

        let ids: Option<Vec<i64>> = cache.get("user_ids").await.unwrap();
        assert_eq!(ids, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_value_is_an_error_not_a_miss() {
        let cache = InMemoryCacheService::new();
        cache.set_raw("users", "not json", MINUTE).await.unwrap();

        let result: CairnResult<Option<Vec<i64>>> = cache.get("users").await;
        assert!(result.is_err());
    }
}
