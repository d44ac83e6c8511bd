//! User service implementation.

use crate::cache::CacheInterface;
use crate::dto::{CacheFootprintResponse, CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::policy::{CachePolicyEngine, CacheSettings};
use crate::user_service::UserService;
use async_trait::async_trait;
use cairn_core::{CairnResult, UserId, ValidateExt};
use cairn_repository::UserRepository;
use shaku::Component;
use std::sync::Arc;
use tracing::debug;

/// Concrete user service component for Shaku DI.
///
/// Holds the backing store and cache store handles for the lifetime of the
/// process and binds a [`CachePolicyEngine`] to them per call.
#[derive(Component)]
#[shaku(interface = UserService)]
pub struct UserServiceComponent {
    #[shaku(inject)]
    user_repository: Arc<dyn UserRepository>,
    #[shaku(inject)]
    cache: Arc<dyn CacheInterface>,
    settings: CacheSettings,
}

impl UserServiceComponent {
    /// Creates a service over explicit handles.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheInterface>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            user_repository,
            cache,
            settings,
        }
    }

    fn engine(&self) -> CachePolicyEngine<'_> {
        CachePolicyEngine::new(
            self.user_repository.as_ref(),
            self.cache.as_ref(),
            &self.settings,
        )
    }
}

#[async_trait]
impl UserService for UserServiceComponent {
    async fn list_users(&self) -> CairnResult<Vec<UserResponse>> {
        debug!(strategy = %self.settings.list_strategy, "Listing users");
        let users = self.engine().list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn list_users_by_index(&self) -> CairnResult<Vec<UserResponse>> {
        let users = self.engine().index().fetch_or_populate().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn get_user(&self, id: UserId) -> CairnResult<UserResponse> {
        let user = self.engine().entity().fetch_or_populate(id).await?;
        Ok(UserResponse::from(user))
    }

    async fn create_user(&self, request: CreateUserRequest) -> CairnResult<UserResponse> {
        request.validate_request()?;
        let new_user = request.into_new_user()?;

        let user = self.engine().create().write_and_sync(new_user).await?;
        Ok(UserResponse::from(user))
    }

    async fn update_user(&self, id: UserId, request: UpdateUserRequest) -> CairnResult<UserResponse> {
        request.validate_request()?;
        let patch = request.into_patch()?;

        let user = self.engine().entity().write_and_sync(id, patch).await?;
        Ok(UserResponse::from(user))
    }

    async fn cache_footprint(&self) -> CairnResult<CacheFootprintResponse> {
        let footprint = self.engine().footprint().await?;
        Ok(CacheFootprintResponse::from(footprint))
    }
}

impl std::fmt::Debug for UserServiceComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserServiceComponent")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
