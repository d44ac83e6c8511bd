//! User service trait definition.

use crate::dto::{CacheFootprintResponse, CreateUserRequest, UpdateUserRequest, UserResponse};
use cairn_core::{CairnResult, Interface, UserId};
use async_trait::async_trait;

/// User service trait.
///
/// Every operation delegates to one cache policy. Listings may lag writes by
/// up to the collection TTL; single-user reads never lag an update made
/// through this service.
#[async_trait]
pub trait UserService: Interface + Send + Sync {
    /// Lists all users through the configured listing policy.
    async fn list_users(&self) -> CairnResult<Vec<UserResponse>>;

    /// Lists all users through the index-only policy, whatever is configured.
    async fn list_users_by_index(&self) -> CairnResult<Vec<UserResponse>>;

    /// Gets a user by ID.
    async fn get_user(&self, id: UserId) -> CairnResult<UserResponse>;

    /// Creates a new user.
    async fn create_user(&self, request: CreateUserRequest) -> CairnResult<UserResponse>;

    /// Merges the present fields into a user and refreshes its cache entry.
    async fn update_user(&self, id: UserId, request: UpdateUserRequest) -> CairnResult<UserResponse>;

    /// Reports the serialized size of the cached listings.
    async fn cache_footprint(&self) -> CairnResult<CacheFootprintResponse>;
}
