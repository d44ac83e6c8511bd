//! Cache policy engine.
//!
//! Each policy owns one operation family and decides which cache key it
//! consults, what it stores there and for how long. Policies never call each
//! other; the listing policies in particular are alternatives, not layers.
//!
//! Concurrent runs are not coordinated. Two requests racing on one key both
//! write it and the cache store keeps the last write. The TTL bounds how long
//! any resulting staleness can last.

mod collection;
mod create;
mod entity;
mod footprint;
mod index;

pub use collection::WholeCollectionPolicy;
pub use create::CreatePolicy;
pub use entity::EntityPolicy;
pub use footprint::{CacheFootprint, KeyFootprint};
pub use index::IndexOnlyPolicy;

use crate::cache::{cache_keys, CacheInterface};
use crate::metrics::{Outcome, PolicyMetrics};
use cairn_config::{CacheConfig, ListStrategy};
use cairn_core::{CairnResult, User};
use cairn_repository::UserRepository;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Tunables shared by every policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL of the `users` and `user_ids` entries.
    pub collection_ttl: Duration,
    /// TTL of `user_{id}` entries.
    pub entity_ttl: Duration,
    /// Which policy serves the full listing.
    pub list_strategy: ListStrategy,
    /// Drop `users` and `user_ids` after every store write.
    pub invalidate_on_write: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            collection_ttl: Duration::from_secs(60),
            entity_ttl: Duration::from_secs(300),
            list_strategy: ListStrategy::Collection,
            invalidate_on_write: false,
        }
    }
}

impl From<&CacheConfig> for CacheSettings {
    fn from(config: &CacheConfig) -> Self {
        Self {
            collection_ttl: config.collection_ttl(),
            entity_ttl: config.entity_ttl(),
            list_strategy: config.list_strategy,
            invalidate_on_write: config.invalidate_on_write,
        }
    }
}

/// Hands out policies bound to one backing store, one cache store and one
/// set of settings.
#[derive(Clone, Copy)]
pub struct CachePolicyEngine<'a> {
    repository: &'a dyn UserRepository,
    cache: &'a dyn CacheInterface,
    settings: &'a CacheSettings,
}

impl<'a> CachePolicyEngine<'a> {
    #[must_use]
    pub fn new(
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

    /// Strategy A: whole-collection cache-aside.
    #[must_use]
    pub fn collection(&self) -> WholeCollectionPolicy<'a> {
        WholeCollectionPolicy::new(self.repository, self.cache, self.settings.collection_ttl)
    }

    /// Strategy B: index-only cache-aside.
    #[must_use]
    pub fn index(&self) -> IndexOnlyPolicy<'a> {
        IndexOnlyPolicy::new(self.repository, self.cache, self.settings.collection_ttl)
    }

    /// Strategies C and D: per-entity cache-aside and write-through.
    #[must_use]
    pub fn entity(&self) -> EntityPolicy<'a> {
        EntityPolicy::new(self.repository, self.cache, self.settings)
    }

    /// Strategy E: create without cache population.
    #[must_use]
    pub fn create(&self) -> CreatePolicy<'a> {
        CreatePolicy::new(self.repository, self.cache, self.settings.invalidate_on_write)
    }

    /// Lists every user through the configured listing policy.
    pub async fn list(&self) -> CairnResult<Vec<User>> {
        match self.settings.list_strategy {
            ListStrategy::Collection => self.collection().fetch_or_populate().await,
            ListStrategy::Index => self.index().fetch_or_populate().await,
        }
    }

    /// Reports the serialized size of every observed listing key.
    pub async fn footprint(&self) -> CairnResult<CacheFootprint> {
        footprint::measure(self.cache).await
    }
}

impl std::fmt::Debug for CachePolicyEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachePolicyEngine")
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}

/// Runs one policy body and records its duration and outcome.
///
/// An unknown id is recorded as a miss: the store was asked and answered.
async fn timed<T, F>(strategy: &'static str, body: F) -> CairnResult<T>
where
    F: Future<Output = CairnResult<(T, Outcome)>>,
{
    let started = Instant::now();
    let result = body.await;
    let outcome = match &result {
        Ok((_, outcome)) => Some(*outcome),
        Err(err) if err.is_not_found() => Some(Outcome::Miss),
        Err(_) => None,
    };
    PolicyMetrics::finished(strategy, outcome, started.elapsed());
    result.map(|(value, _)| value)
}

/// Drops both listing keys so the next listing reloads from the store.
async fn invalidate_listings(cache: &dyn CacheInterface) -> CairnResult<()> {
    for key in [cache_keys::USERS, cache_keys::USER_IDS] {
        if cache.delete(key).await? {
            PolicyMetrics::invalidated(key);
            debug!(key, "Invalidated listing key after write");
        }
    }
    Ok(())
}
