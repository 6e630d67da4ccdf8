//! Current user (me) endpoints.
//!
//! Every route requires an access token; see `auth_middleware`.

use axum::{
    Extension, Json, middleware,
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    DeleteAccountRequest, ErrorResponse, MeResponse, PictureParams, UpdateEmailRequest,
    UpdateNameRequest, UpdateOnlineStatusRequest, UpdateUsernameRequest,
};
use crate::api::handlers::me_response;
use crate::api::middleware::{AuthUser, auth_middleware};
use crate::error::AppResult;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates the "me" routes (current authenticated user)
///
/// # Routes
/// - `GET /`, `DELETE /`
/// - `PATCH /name`, `/username`, `/email`, `/online-status`
/// - `PUT /picture?ratio=` with the raw image as body
pub fn me_routes(state: &AppState) -> OpenApiRouter<AppState> {
    // Room for the image on top of the configured limit
    let picture_limit = state.settings.storage.max_file_size.saturating_add(1024);

    let picture = OpenApiRouter::new()
        .routes(routes!(update_picture))
        .layer(DefaultBodyLimit::max(picture_limit));

    OpenApiRouter::new()
        .routes(routes!(get_me, delete_me))
        .routes(routes!(update_name))
        .routes(routes!(update_username))
        .routes(routes!(update_email))
        .routes(routes!(update_online_status))
        .merge(picture)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Current user information
#[utoipa::path(
    get,
    path = "/",
    tag = USER_TAG,
    responses(
        (status = 200, description = "Current user information", body = MeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn get_me(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<MeResponse>> {
    Ok(Json(me_response(&state, user).await?))
}

/// Delete the account
///
/// The stored picture is removed in the background.
#[utoipa::path(
    delete,
    path = "/",
    tag = USER_TAG,
    request_body = DeleteAccountRequest,
    responses(
        (status = 204, description = "Account deleted"),
        (status = 400, description = "Wrong password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn delete_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<DeleteAccountRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .users
        .delete(auth_user.id(), &payload.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/name",
    tag = USER_TAG,
    request_body = UpdateNameRequest,
    responses(
        (status = 200, description = "Name updated", body = MeResponse),
        (status = 400, description = "Invalid or unchanged name", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_name(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateNameRequest>,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .services
        .users
        .update_name(auth_user.id(), &payload.name)
        .await?;
    Ok(Json(me_response(&state, user).await?))
}

#[utoipa::path(
    patch,
    path = "/username",
    tag = USER_TAG,
    request_body = UpdateUsernameRequest,
    responses(
        (status = 200, description = "Username updated", body = MeResponse),
        (status = 400, description = "Invalid or unchanged username", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_username(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateUsernameRequest>,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .services
        .users
        .update_username(auth_user.id(), &payload.username)
        .await?;
    Ok(Json(me_response(&state, user).await?))
}

/// Change the email address
///
/// Requires the current password.
#[utoipa::path(
    patch,
    path = "/email",
    tag = USER_TAG,
    request_body = UpdateEmailRequest,
    responses(
        (status = 200, description = "Email updated", body = MeResponse),
        (status = 400, description = "Wrong password or unchanged email", body = ErrorResponse),
        (status = 409, description = "Email taken", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_email(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateEmailRequest>,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .services
        .users
        .update_email(auth_user.id(), &payload.email, &payload.password)
        .await?;
    Ok(Json(me_response(&state, user).await?))
}

/// Update presence settings
#[utoipa::path(
    patch,
    path = "/online-status",
    tag = USER_TAG,
    request_body = UpdateOnlineStatusRequest,
    responses(
        (status = 200, description = "Presence updated", body = MeResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_online_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdateOnlineStatusRequest>,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .services
        .users
        .update_online_status(auth_user.id(), payload.online_status, payload.default_status)
        .await?;
    Ok(Json(me_response(&state, user).await?))
}

/// Upload a profile picture
///
/// The body is the raw JPEG, PNG or WebP image.
#[utoipa::path(
    put,
    path = "/picture",
    tag = USER_TAG,
    params(PictureParams),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Picture updated", body = MeResponse),
        (status = 400, description = "Empty image or invalid ratio", body = ErrorResponse),
        (status = 422, description = "Unsupported format or too large", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_picture(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<PictureParams>,
    body: Bytes,
) -> AppResult<Json<MeResponse>> {
    let user = state
        .services
        .users
        .update_picture(auth_user.id(), body, params.ratio)
        .await?;
    Ok(Json(me_response(&state, user).await?))
}
