//! Index-only cache-aside.

use super::timed;
use crate::cache::{cache_keys, CacheExt, CacheInterface};
use crate::metrics::{Outcome, PolicyMetrics};
use cairn_core::{CairnResult, User, UserId};
use cairn_repository::UserRepository;
use std::time::Duration;
use tracing::debug;

const STRATEGY: &str = "index";

/// Caches only the user ids under `user_ids`.
///
/// The cached payload is much smaller than the whole collection, but a hit
/// still costs one indexed `find_by_ids` query, where the collection policy
/// costs none. Users fetched on a hit are not cached. Users created after the
/// index was cached stay invisible until it expires.
pub struct IndexOnlyPolicy<'a> {
    repository: &'a dyn UserRepository,
    cache: &'a dyn CacheInterface,
    ttl: Duration,
}

impl<'a> IndexOnlyPolicy<'a> {
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

    /// Returns every user, resolving cached ids against the store on a hit.
    pub async fn fetch_or_populate(&self) -> CairnResult<Vec<User>> {
        timed(STRATEGY, self.run()).await
    }

    async fn run(&self) -> CairnResult<(Vec<User>, Outcome)> {
        if let Some(ids) = self.cache.get::<Vec<UserId>>(cache_keys::USER_IDS).await? {
            if ids.is_empty() {
                debug!("Cached index is empty, skipping store lookup");
                return Ok((Vec::new(), Outcome::Hit));
            }

            let users = self.repository.find_by_ids(&ids).await?;
            PolicyMetrics::store_query(STRATEGY, "find_by_ids");
            debug!(ids = ids.len(), found = users.len(), "Users resolved from cached index");
            return Ok((users, Outcome::Hit));
        }

        debug!("Index cache empty, loading users from store");
        let users = self.repository.find_all().await?;
        PolicyMetrics::store_query(STRATEGY, "find_all");

        let ids: Vec<UserId> = users.iter().map(|user| user.id).collect();
        self.cache.set(cache_keys::USER_IDS, &ids, self.ttl).await?;
        PolicyMetrics::populated(STRATEGY);
        debug!(count = ids.len(), ttl_secs = self.ttl.as_secs(), "Index cache populated");

        Ok((users, Outcome::Miss))
    }
}
