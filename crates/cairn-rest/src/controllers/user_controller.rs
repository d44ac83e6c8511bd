//! User resource controller.
//!
//! Listings are served from caches that may lag writes by up to their TTL.
//! A single-user read always reflects the last update made through this API.

use crate::{
    extractors::ValidatedJson,
    responses::{created, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use cairn_core::{CairnError, ErrorResponse, UserId};
use cairn_service::{CacheFootprintResponse, CreateUserRequest, UpdateUserRequest, UserResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::debug;

/// Creates the user router, nested under `/users`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/all", get(list_users))
        .route("/all/test/ids", get(list_users_by_index))
        .route("/cache/memory", get(cache_footprint))
        .route("/:id", get(get_user).put(update_user).patch(update_user))
}

/// List all users through the configured listing cache.
#[utoipa::path(
    get,
    path = "/users/all",
    tag = "users",
    responses(
        (status = 200, description = "Every user; may lag writes by up to the collection TTL", body = Vec<UserResponse>),
        (status = 503, description = "Backing store or cache store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserResponse>> {
    debug!("List users request");
    ok(state.user_service.list_users().await?)
}

/// List all users through the id-index cache.
///
/// A cache hit still costs one indexed store query; the cached payload holds
/// ids only.
#[utoipa::path(
    get,
    path = "/users/all/test/ids",
    tag = "users",
    responses(
        (status = 200, description = "Every user, resolved from the cached id index", body = Vec<UserResponse>),
        (status = 503, description = "Backing store or cache store unavailable", body = ErrorResponse)
    )
)]
pub async fn list_users_by_index(State(state): State<AppState>) -> ApiResult<Vec<UserResponse>> {
    debug!("List users by index request");
    ok(state.user_service.list_users_by_index().await?)
}

/// Report the serialized size of the cached listings.
#[utoipa::path(
    get,
    path = "/users/cache/memory",
    tag = "users",
    responses(
        (status = 200, description = "Per-key sizes; absent keys are flagged missing", body = CacheFootprintResponse),
        (status = 503, description = "Cache store unavailable", body = ErrorResponse)
    )
)]
pub async fn cache_footprint(State(state): State<AppState>) -> ApiResult<CacheFootprintResponse> {
    ok(state.user_service.cache_footprint().await?)
}

/// Create a new user.
///
/// Listing caches do not see the new user until they expire.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Malformed JSON", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), AppError> {
    debug!(name = %request.name, "Create user request");

    let response = state.user_service.create_user(request).await?;
    Ok(created(response))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    let user_id = parse_user_id(&id)?;
    ok(state.user_service.get_user(user_id).await?)
}

/// Update a user. Absent fields keep their stored value.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    debug!(%id, "Update user request");

    let user_id = parse_user_id(&id)?;
    ok(state.user_service.update_user(user_id, request).await?)
}

fn parse_user_id(id: &str) -> Result<UserId, AppError> {
    UserId::parse(id)
        .map_err(|_| AppError(CairnError::Validation(format!("Invalid user ID: {id}"))))
}
