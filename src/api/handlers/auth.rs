//! Authentication handlers: local accounts, tokens and OAuth.

use axum::{
    Extension, Json, middleware,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::AUTH_TAG;
use crate::api::dto::{
    AuthResponse, ConfirmEmailRequest, ErrorResponse, ForgotPasswordRequest, MessageResponse,
    OAuthCallbackParams, RefreshTokenRequest, ResetPasswordRequest, SignInRequest, SignUpRequest,
    UpdatePasswordRequest,
};
use crate::api::handlers::auth_response;
use crate::api::middleware::{AuthUser, auth_middleware};
use crate::error::AppResult;
use crate::models::OAuthProvider;
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Creates the authentication routes
///
/// # Routes
/// - `POST /sign-up`, `POST /sign-in`, `POST /refresh`
/// - `POST /confirm-email`, `POST /forgot-password`, `POST /reset-password`
/// - `GET /oauth/{provider}`, `GET /oauth/{provider}/callback`
/// - `POST /logout`, `PATCH /update-password` (authenticated)
pub fn auth_routes(state: &AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .routes(routes!(logout))
        .routes(routes!(update_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    OpenApiRouter::new()
        .routes(routes!(sign_up))
        .routes(routes!(sign_in))
        .routes(routes!(refresh_token))
        .routes(routes!(confirm_email))
        .routes(routes!(forgot_password))
        .routes(routes!(reset_password))
        .routes(routes!(oauth_authorize))
        .routes(routes!(oauth_callback))
        .merge(protected)
}

/// Register a local account
///
/// A confirmation link is mailed; the account cannot sign in until confirmed.
#[utoipa::path(
    post,
    path = "/sign-up",
    tag = AUTH_TAG,
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Invalid request data", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignUpRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    state
        .services
        .auth
        .sign_up(
            &payload.email,
            &payload.name,
            &payload.password,
            &payload.password_confirmation,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful, check your email")),
    ))
}

/// Sign in with email or username
#[utoipa::path(
    post,
    path = "/sign-in",
    tag = AUTH_TAG,
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials or unconfirmed email", body = ErrorResponse)
    )
)]
async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignInRequest>,
) -> AppResult<Json<AuthResponse>> {
    let tokens = state
        .services
        .auth
        .sign_in(&payload.email_or_username, &payload.password)
        .await?;
    Ok(Json(auth_response(&state, tokens).await?))
}

/// Rotate a refresh token
///
/// The presented refresh token is revoked and a new pair is issued.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = AUTH_TAG,
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = AuthResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token", body = ErrorResponse)
    )
)]
async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<Json<AuthResponse>> {
    let tokens = state.services.auth.refresh(&payload.refresh_token).await?;
    Ok(Json(auth_response(&state, tokens).await?))
}

/// Revoke a refresh token and end the session
#[utoipa::path(
    post,
    path = "/logout",
    tag = AUTH_TAG,
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<RefreshTokenRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth
        .logout(auth_user.id(), &payload.refresh_token)
        .await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// Confirm an email address
#[utoipa::path(
    post,
    path = "/confirm-email",
    tag = AUTH_TAG,
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "Email confirmed, signed in", body = AuthResponse),
        (status = 400, description = "Email already confirmed", body = ErrorResponse),
        (status = 401, description = "Invalid or stale token", body = ErrorResponse)
    )
)]
async fn confirm_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ConfirmEmailRequest>,
) -> AppResult<Json<AuthResponse>> {
    let tokens = state
        .services
        .auth
        .confirm_email(&payload.confirmation_token)
        .await?;
    Ok(Json(auth_response(&state, tokens).await?))
}

/// Request a password reset link
///
/// The response is the same whether or not the account exists.
#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = AUTH_TAG,
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request accepted", body = MessageResponse)
    )
)]
async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse::new(
        "If an account with that email exists, a reset link has been sent",
    )))
}

/// Set a new password from a reset link
#[utoipa::path(
    post,
    path = "/reset-password",
    tag = AUTH_TAG,
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Passwords do not match", body = ErrorResponse),
        (status = 401, description = "Invalid or stale token", body = ErrorResponse)
    )
)]
async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth
        .reset_password(
            &payload.reset_token,
            &payload.password,
            &payload.password_confirmation,
        )
        .await?;
    Ok(Json(MessageResponse::new("Password reset successfully")))
}

/// Change the password of the signed-in user
///
/// Every previously issued token becomes invalid.
#[utoipa::path(
    patch,
    path = "/update-password",
    tag = AUTH_TAG,
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated, new tokens issued", body = AuthResponse),
        (status = 400, description = "Wrong or unchanged password", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearerAuth" = []))
)]
async fn update_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UpdatePasswordRequest>,
) -> AppResult<Json<AuthResponse>> {
    let tokens = state
        .services
        .auth
        .update_password(
            auth_user.id(),
            payload.old_password.as_deref(),
            &payload.password,
            &payload.password_confirmation,
        )
        .await?;
    Ok(Json(auth_response(&state, tokens).await?))
}

/// Redirect to the provider's consent page
#[utoipa::path(
    get,
    path = "/oauth/{provider}",
    tag = AUTH_TAG,
    params(("provider" = String, Path, description = "google, facebook, github or microsoft")),
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 404, description = "Provider not configured", body = ErrorResponse)
    )
)]
async fn oauth_authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<Redirect> {
    let provider: OAuthProvider = provider.parse()?;
    let url = state.services.oauth.authorization_url(provider).await?;
    Ok(Redirect::to(&url))
}

/// Provider callback
#[utoipa::path(
    get,
    path = "/oauth/{provider}/callback",
    tag = AUTH_TAG,
    params(
        ("provider" = String, Path, description = "google, facebook, github or microsoft"),
        OAuthCallbackParams
    ),
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid state or code", body = ErrorResponse),
        (status = 404, description = "Provider not configured", body = ErrorResponse)
    )
)]
async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthCallbackParams>,
) -> AppResult<Json<AuthResponse>> {
    let provider: OAuthProvider = provider.parse()?;
    let tokens = state
        .services
        .oauth
        .callback(provider, &params.code, &params.state)
        .await?;
    Ok(Json(auth_response(&state, tokens).await?))
}
