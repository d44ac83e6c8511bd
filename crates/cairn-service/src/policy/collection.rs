//! Whole-collection cache-aside.

use super::timed;
use crate::cache::{cache_keys, CacheExt, CacheInterface};
use crate::metrics::{Outcome, PolicyMetrics};
use cairn_core::{CairnResult, User};
use cairn_repository::UserRepository;
use std::time::Duration;
use tracing::debug;

const STRATEGY: &str = "collection";

/// Caches the full user list under `users`.
///
/// A hit costs no store query. A miss costs one `find_all` and repopulates
/// the key. An empty list is a valid cached value, not a miss.
pub struct WholeCollectionPolicy<'a> {
    repository: &'a dyn UserRepository,
    cache: &'a dyn CacheInterface,
    ttl: Duration,
}

impl<'a> WholeCollectionPolicy<'a> {
    pub(super) fn new(
        repository: &'a dyn UserRepository,
        cache: &'a dyn CacheInterface,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            ttl,
        }
    }

    /// Returns every user, from the cache when the entry is live.
    pub async fn fetch_or_populate(&self) -> CairnResult<Vec<User>> {
        timed(STRATEGY, self.run()).await
    }

    async fn run(&self) -> CairnResult<(Vec<User>, Outcome)> {
        if let Some(users) = self.cache.get::<Vec<User>>(cache_keys::USERS).await? {
            debug!(count = users.len(), "Users served from collection cache");
            return Ok((users, Outcome::Hit));
        }

        debug!("Collection cache empty, loading users from store");
        let users = self.repository.find_all().await?;
        PolicyMetrics::store_query(STRATEGY, "find_all");

        self.cache.set(cache_keys::USERS, &users, self.ttl).await?;
        PolicyMetrics::populated(STRATEGY);
        debug!(count = users.len(), ttl_secs = self.ttl.as_secs(), "Collection cache populated");

        Ok((users, Outcome::Miss))
    }
}
