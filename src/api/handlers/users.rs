//! Public user lookups and listing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use validator::Validate;

use crate::api::doc::USER_TAG;
use crate::api::dto::{ErrorResponse, UserPageResponse, UserQueryParams, UserResponse};
use crate::error::AppResult;
use crate::state::AppState;

/// Creates user-related routes.
///
/// Routes:
/// - GET /                     - Confirmed users, cursor paginated
/// - GET /{id}                 - User by ID
/// - GET /username/{username}  - User by username
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user))
        .routes(routes!(get_user_by_username))
}

/// List confirmed users ordered by username
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    params(UserQueryParams),
    responses(
        (status = 200, description = "One page of users", body = UserPageResponse),
        (status = 400, description = "Invalid page size or cursor", body = ErrorResponse)
    )
)]
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserQueryParams>,
) -> AppResult<Json<UserPageResponse>> {
    params.validate()?;
    let page = state
        .services
        .users
        .query(params.search.as_deref(), params.first, params.after)
        .await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.find_one_by_id(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/username/{username}",
    tag = USER_TAG,
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.find_one_by_username(&username).await?;
    Ok(Json(user.into()))
}
