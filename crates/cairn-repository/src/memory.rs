//! In-memory user repository.
//!
//! Serves the same contract as [`PgUserRepository`](crate::PgUserRepository)
//! from a map guarded by a mutex. Every call is counted by kind, and the
//! store can be switched offline to exercise failure propagation.

use crate::traits::UserRepository;
use async_trait::async_trait;
use cairn_core::{CairnError, CairnResult, NewUser, User, UserId, UserPatch};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Snapshot of how many queries an [`InMemoryUserRepository`] has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryCounts {
    pub find_all: usize,
    pub find_by_ids: usize,
    pub find_by_id: usize,
    pub create: usize,
    pub merge_and_persist: usize,
}

impl QueryCounts {
    /// Total store round-trips across all kinds.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.find_all + self.find_by_ids + self.find_by_id + self.create + self.merge_and_persist
    }

    /// Round-trips that only read.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.find_all + self.find_by_ids + self.find_by_id
    }
}

#[derive(Default)]
struct Counters {
    find_all: AtomicUsize,
    find_by_ids: AtomicUsize,
    find_by_id: AtomicUsize,
    create: AtomicUsize,
    merge_and_persist: AtomicUsize,
}

/// Map-backed user repository with query accounting.
pub struct InMemoryUserRepository {
    users: Mutex<BTreeMap<UserId, User>>,
    next_id: AtomicI64,
    counters: Counters,
    offline: AtomicBool,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            counters: Counters::default(),
            offline: AtomicBool::new(false),
        }
    }

    /// Seeds the store without counting queries. Ids are assigned in order.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = NewUser>) -> Self {
        let repo = Self::new();
        if let Ok(mut map) = repo.users.lock() {
            for user in users {
                let stored = repo.assign_id(user);
                map.insert(stored.id, stored);
            }
        }
        repo
    }

    /// Returns how many queries each operation has served so far.
    #[must_use]
    pub fn query_counts(&self) -> QueryCounts {
        QueryCounts {
            find_all: self.counters.find_all.load(Ordering::SeqCst),
            find_by_ids: self.counters.find_by_ids.load(Ordering::SeqCst),
            find_by_id: self.counters.find_by_id.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            merge_and_persist: self.counters.merge_and_persist.load(Ordering::SeqCst),
        }
    }

    /// Makes every subsequent call fail with a database error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored users. Not counted as a query.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.lock().map(|m| m.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn assign_id(&self, user: NewUser) -> User {
        User {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: user.name,
            email: user.email,
        }
    }

    fn begin(&self, counter: &AtomicUsize) -> CairnResult<std::sync::MutexGuard<'_, BTreeMap<UserId, User>>> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(CairnError::Database("connection refused".to_string()));
        }
        self.users
            .lock()
            .map_err(|_| CairnError::internal("user map poisoned"))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> CairnResult<Vec<User>> {
        let users = self.begin(&self.counters.find_all)?;
        Ok(users.values().cloned().collect())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> CairnResult<Vec<User>> {
        let users = self.begin(&self.counters.find_by_ids)?;
        Ok(users
            .values()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: UserId) -> CairnResult<Option<User>> {
        let users = self.begin(&self.counters.find_by_id)?;
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> CairnResult<User> {
        let mut users = self.begin(&self.counters.create)?;
        let stored = self.assign_id(user);
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn merge_and_persist(&self, id: UserId, patch: UserPatch) -> CairnResult<Option<User>> {
        let mut users = self.begin(&self.counters.merge_and_persist)?;
        Ok(users.get_mut(&id).map(|user| {
            user.apply(patch);
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Email;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::new(name, Email::new(email).unwrap())
    }

    fn seeded() -> InMemoryUserRepository {
        InMemoryUserRepository::with_users([
            new_user("John Doe", "johndoe@example.com"),
            new_user("Jane Roe", "janeroe@example.com"),
            new_user("Max Poe", "maxpoe@example.com"),
        ])
    }

    #[tokio::test]
    async fn test_seeding_is_not_counted() {
        let repo = seeded();
        assert_eq!(repo.len(), 3);
        assert_eq!(repo.query_counts(), QueryCounts::default());
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.create(new_user("A", "a@example.com")).await.unwrap();
        let second = repo.create(new_user("B", "b@example.com")).await.unwrap();

        assert_eq!(first.id, UserId::new(1));
        assert_eq!(second.id, UserId::new(2));
        assert_eq!(repo.query_counts().create, 2);
    }

    #[tokio::test]
    async fn test_find_all_ordered_by_id() {
        let repo = seeded();
        let users = repo.find_all().await.unwrap();

        let ids: Vec<i64> = users.iter().map(|u| u.id.into_inner()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(repo.query_counts().find_all, 1);
    }

    #[tokio::test]
    async fn test_find_by_ids_skips_unknown() {
        let repo = seeded();
        let users = repo
            .find_by_ids(&[UserId::new(3), UserId::new(1), UserId::new(99)])
            .await
            .unwrap();

        let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Max Poe"]);
        assert_eq!(repo.query_counts().find_by_ids, 1);
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let repo = seeded();

        assert_eq!(
            repo.find_by_id(UserId::new(2)).await.unwrap().map(|u| u.name),
            Some("Jane Roe".to_string())
        );
        assert!(repo.find_by_id(UserId::new(42)).await.unwrap().is_none());
        assert_eq!(repo.query_counts().find_by_id, 2);
    }

    #[tokio::test]
    async fn test_merge_and_persist_partial() {
        let repo = seeded();
        let patch = UserPatch {
            name: Some("Johnny".to_string()),
            email: None,
        };

        let updated = repo.merge_and_persist(UserId::new(1), patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Johnny");
        assert_eq!(updated.email.as_str(), "johndoe@example.com");

        let stored = repo.find_by_id(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_merge_and_persist_missing_id() {
        let repo = seeded();
        let result = repo
            .merge_and_persist(UserId::new(42), UserPatch::default())
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(repo.len(), 3);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let repo = seeded();
        repo.set_offline(true);

        let err = repo.find_all().await.unwrap_err();
        assert!(err.is_store_unavailable());
        assert!(repo.create(new_user("X", "x@example.com")).await.is_err());
        assert_eq!(repo.query_counts().total(), 2);

        repo.set_offline(false);
        assert_eq!(repo.find_all().await.unwrap().len(), 3);
    }

    #[test]
    fn test_query_counts_totals() {
        let counts = QueryCounts {
            find_all: 1,
            find_by_ids: 2,
            find_by_id: 3,
            create: 4,
            merge_and_persist: 5,
        };
        assert_eq!(counts.total(), 15);
        assert_eq!(counts.reads(), 6);
    }
}
