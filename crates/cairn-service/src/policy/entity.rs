//! Per-entity cache-aside reads and write-through updates.

use super::{invalidate_listings, timed, CacheSettings};
use crate::cache::{cache_keys, CacheExt, CacheInterface};
use crate::metrics::{Outcome, PolicyMetrics};
use cairn_core::{CairnError, CairnResult, User, UserId, UserPatch};
use cairn_repository::UserRepository;
use tracing::{debug, info};

const READ_STRATEGY: &str = "entity";
const WRITE_STRATEGY: &str = "write_through";

/// Caches single users under `user_{id}`.
///
/// Reads and updates share the key, so a read after a successful update sees
/// the update immediately. Neither path touches `users` or `user_ids` unless
/// invalidation on write is enabled.
pub struct EntityPolicy<'a> {
    repository: &'a dyn UserRepository,
    cache: &'a dyn CacheInterface,
    settings: &'a CacheSettings,
}

impl<'a> EntityPolicy<'a> {
    pub(super) fn new(
        repository: &'a dyn UserRepository,
        cache: &'a dyn CacheInterface,
        settings: &'a CacheSettings,
    ) -> Self {
        Self {
            repository,
            cache,
            settings,
        }
    }

    /// Returns one user, from the cache when the entry is live.
    ///
    /// Fails with `NotFound` for an unknown id and caches nothing for it.
    pub async fn fetch_or_populate(&self, id: UserId) -> CairnResult<User> {
        timed(READ_STRATEGY, self.read(id)).await
    }

    /// Merges `patch` into the stored user, persists it and overwrites its
    /// cache entry.
    ///
    /// Fails with `NotFound` for an unknown id and caches nothing for it.
    pub async fn write_and_sync(&self, id: UserId, patch: UserPatch) -> CairnResult<User> {
        timed(WRITE_STRATEGY, self.write(id, patch)).await
    }

    async fn read(&self, id: UserId) -> CairnResult<(User, Outcome)> {
        let key = cache_keys::user(id);

        if let Some(user) = self.cache.get::<User>(&key).await? {
            debug!(%id, "User served from entity cache");
            return Ok((user, Outcome::Hit));
        }

        let found = self.repository.find_by_id(id).await?;
        PolicyMetrics::store_query(READ_STRATEGY, "find_by_id");
        let user = found.ok_or_else(|| CairnError::not_found("User", id))?;

        self.cache.set(&key, &user, self.settings.entity_ttl).await?;
        PolicyMetrics::populated(READ_STRATEGY);
        debug!(%id, ttl_secs = self.settings.entity_ttl.as_secs(), "Entity cache populated");

        Ok((user, Outcome::Miss))
    }

    async fn write(&self, id: UserId, patch: UserPatch) -> CairnResult<(User, Outcome)> {
        let merged = self.repository.merge_and_persist(id, patch).await?;
        PolicyMetrics::store_query(WRITE_STRATEGY, "merge_and_persist");
        let user = merged.ok_or_else(|| CairnError::not_found("User", id))?;

        self.cache
            .set(&cache_keys::user(id), &user, self.settings.entity_ttl)
            .await?;
        PolicyMetrics::written(WRITE_STRATEGY);

        if self.settings.invalidate_on_write {
            invalidate_listings(self.cache).await?;
        }

        info!(%id, "User updated and entity cache synced");
        Ok((user, Outcome::Write))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::cache::InMemoryCacheService;
    use crate::metrics::names;
    use crate::CachePolicyEngine;
    use cairn_core::Email;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::{CompositeKey, MetricKind};
    use std::time::Duration;

    type SnapshotEntry = (
        CompositeKey,
        Option<::metrics::Unit>,
        Option<::metrics::SharedString>,
        DebugValue,
    );

    fn rename(name: &str) -> UserPatch {
        UserPatch {
            name: Some(name.to_string()),
            email: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_populates_then_hits() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        let first = engine.entity().fetch_or_populate(UserId::new(2)).await.unwrap();
        let second = engine.entity().fetch_or_populate(UserId::new(2)).await.unwrap();

        assert_eq!(first.name, "Jane Roe");
        assert_eq!(second, first);
        assert_eq!(repo.query_counts().find_by_id, 1);
        assert!(cache.get_raw("user_2").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entity_entry_lives_five_minutes() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();
        assert_eq!(repo.query_counts().find_by_id, 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();
        assert_eq!(repo.query_counts().find_by_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_of_unknown_id_is_not_found_and_not_cached() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        let err = engine.entity().fetch_or_populate(UserId::new(42)).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(cache.get_raw("user_42").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_is_visible_to_next_read() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        // Prime the entity cache with the old value first.
        engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();

        let patch = UserPatch {
            name: None,
            email: Some(Email::new("john@example.org").unwrap()),
        };
        let updated = engine.entity().write_and_sync(UserId::new(1), patch).await.unwrap();
        let read = engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();

        assert_eq!(read, updated);
        assert_eq!(read.name, "John Doe");
        assert_eq!(read.email.as_str(), "john@example.org");
        assert_eq!(repo.query_counts().find_by_id, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_of_unknown_id_is_not_found_and_not_cached() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        let err = engine
            .entity()
            .write_and_sync(UserId::new(42), rename("Ghost"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(cache.is_empty());
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_leaves_listing_keys_by_default() {
        let (repo, cache) = stores();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        engine.collection().fetch_or_populate().await.unwrap();
        engine.entity().write_and_sync(UserId::new(1), rename("Johnny")).await.unwrap();

        assert!(cache.get_raw(cache_keys::USERS).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_legacy_email_row_survives_read_and_write_through() {
        let repo = cairn_repository::InMemoryUserRepository::with_users([cairn_core::NewUser::new(
            "Legacy",
            Email::new_unchecked("legacy.user"),
        )]);
        let cache = InMemoryCacheService::new();
        let settings = CacheSettings::default();
        let engine = CachePolicyEngine::new(&repo, &cache, &settings);

        let miss = engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();
        let hit = engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();
        assert_eq!(hit, miss);
        assert_eq!(repo.query_counts().find_by_id, 1);

        engine.entity().write_and_sync(UserId::new(1), rename("Legacy Two")).await.unwrap();
        let after_update = engine.entity().fetch_or_populate(UserId::new(1)).await.unwrap();
        assert_eq!(after_update.name, "Legacy Two");
        assert_eq!(after_update.email.as_str(), "legacy.user");
        assert_eq!(repo.query_counts().find_by_id, 1);
    }

    #[tokio::test]
    async fn test_write_through_failure_after_persist_propagates() {
        let repo = seeded_repository();
        let mut cache = MockCache::new();
        cache
            .expect_set_raw()
            .withf(|key, _, ttl| key == "user_1" && *ttl == Duration::from_secs(300))
            .times(1)
            .returning(|_, _, _| Err(CairnError::cache("connection refused")));
        cache.expect_delete().never();

        let settings = CacheSettings::default();
        let policy = EntityPolicy::new(&repo, &cache, &settings);
        let err = policy.write_and_sync(UserId::new(1), rename("Johnny")).await.unwrap_err();

        assert!(matches!(err, CairnError::Cache(_)));
        // The store write is not rolled back.
        assert_eq!(repo.find_by_id(UserId::new(1)).await.unwrap().unwrap().name, "Johnny");
    }

    fn counter(entries: &[SnapshotEntry], name: &str, label: (&str, &str)) -> Option<u64> {
        entries.iter().find_map(|(key, _, _, value)| {
            let matches = key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
            match value {
                DebugValue::Counter(count) if matches => Some(*count),
                _ => None,
            }
        })
    }

    #[test]
    fn test_unknown_id_is_counted_as_store_query_and_miss() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        ::metrics::with_local_recorder(&recorder, || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let (repo, cache) = stores();
                let settings = CacheSettings::default();
                let engine = CachePolicyEngine::new(&repo, &cache, &settings);

                let read = engine.entity().fetch_or_populate(UserId::new(42)).await;
                let write = engine.entity().write_and_sync(UserId::new(42), rename("Ghost")).await;
                assert!(read.unwrap_err().is_not_found());
                assert!(write.unwrap_err().is_not_found());
            });
        });

        let entries = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter(&entries, names::STORE_QUERIES_TOTAL, ("query", "find_by_id")),
            Some(1)
        );
        assert_eq!(
            counter(&entries, names::STORE_QUERIES_TOTAL, ("query", "merge_and_persist")),
            Some(1)
        );
        assert_eq!(counter(&entries, names::CACHE_MISSES_TOTAL, ("strategy", "entity")), Some(1));
        assert_eq!(counter(&entries, names::POLICY_ERRORS_TOTAL, ("strategy", "entity")), None);
        assert_eq!(
            counter(&entries, names::POLICY_ERRORS_TOTAL, ("strategy", "write_through")),
            None
        );
    }

    #[tokio::test]
    async fn test_store_failure_on_read_propagates() {
        let repo = seeded_repository();
        repo.set_offline(true);
        let cache = InMemoryCacheService::new();
        let settings = CacheSettings::default();

        let err = EntityPolicy::new(&repo, &cache, &settings)
            .fetch_or_populate(UserId::new(1))
            .await
            .unwrap_err();

        assert!(matches!(err, CairnError::Database(_)));
        assert!(cache.is_empty());
    }
}
