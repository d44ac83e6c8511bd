//! OpenAPI documentation configuration.

use crate::controllers::health_controller::{HealthResponse, ProbeResult, ReadinessResponse};
use cairn_core::{ErrorResponse, FieldError, UserId};
use cairn_service::{
    CacheFootprintResponse, CacheKeySize, CreateUserRequest, UpdateUserRequest, UserResponse,
};
use utoipa::OpenApi;

/// OpenAPI documentation for the Cairn API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cairn API",
        version = "0.1.0",
        description = "User resource backed by PostgreSQL with a TTL-bounded cache layer. \
            Listings may lag writes by up to the collection TTL; single-user reads do not.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    paths(
        // User endpoints
        crate::controllers::user_controller::list_users,
        crate::controllers::user_controller::list_users_by_index,
        crate::controllers::user_controller::cache_footprint,
        crate::controllers::user_controller::create_user,
        crate::controllers::user_controller::get_user,
        crate::controllers::user_controller::update_user,
        // Health endpoints
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            UserId,
            ErrorResponse,
            FieldError,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            CacheKeySize,
            CacheFootprintResponse,
            HealthResponse,
            ProbeResult,
            ReadinessResponse,
        )
    ),
    tags(
        (name = "users", description = "User resource and cache diagnostics"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;
