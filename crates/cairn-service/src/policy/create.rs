//! Create without cache population.

use super::{invalidate_listings, timed};
use crate::cache::CacheInterface;
use crate::metrics::{Outcome, PolicyMetrics};
use cairn_core::{CairnResult, NewUser, User};
use cairn_repository::UserRepository;
use tracing::info;

const STRATEGY: &str = "create";

/// Persists new users and leaves the cache alone.
///
/// A live `users` or `user_ids` entry keeps omitting the new user until it
/// expires, unless invalidation on write is enabled.
pub struct CreatePolicy<'a> {
    repository: &'a dyn UserRepository,
    cache: &'a dyn CacheInterface,
    invalidate_on_write: bool,
}

impl<'a> CreatePolicy<'a> {
    pub(super) fn new(
        repository: &'a dyn UserRepository,
        cache: &'a dyn CacheInterface,
        invalidate_on_write: bool,
    ) -> Self {
        Self {
            repository,
            cache,
            invalidate_on_write,
        }
    }

    /// Persists `user` and returns it with its assigned id.
    pub async fn write_and_sync(&self, user: NewUser) -> CairnResult<User> {
        timed(STRATEGY, self.write(user)).await
    }

    async fn write(&self, user: NewUser) -> CairnResult<(User, Outcome)> {
        let created = self.repository.create(user).await?;
        PolicyMetrics::store_query(STRATEGY, "create");

        if self.invalidate_on_write {
            invalidate_listings(self.cache).await?;
        }

        info!(id = %created.id, "User created");
        Ok((created, Outcome::Write))
    }
}
