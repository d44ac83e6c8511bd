//! Repository trait definitions.

use cairn_core::{CairnResult, Interface, NewUser, User, UserId, UserPatch};
use async_trait::async_trait;

/// Backing store client for user records.
///
/// Every method is exactly one store round-trip.
#[async_trait]
pub trait UserRepository: Interface + Send + Sync {
    /// Returns every stored user, ordered by id.
    async fn find_all(&self) -> CairnResult<Vec<User>>;

    /// Returns the users whose ids are in `ids`, ordered by id.
    /// Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[UserId]) -> CairnResult<Vec<User>>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: UserId) -> CairnResult<Option<User>>;

    /// Inserts a new user and returns it with its assigned id.
    async fn create(&self, user: NewUser) -> CairnResult<User>;

    /// Merges `patch` onto the stored user and persists the result.
    ///
    /// Returns `None` when no user has this id.
    async fn merge_and_persist(&self, id: UserId, patch: UserPatch) -> CairnResult<Option<User>>;
}
