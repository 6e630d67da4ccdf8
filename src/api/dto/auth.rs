//! Authentication-related Data Transfer Objects

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::dto::MeResponse;
use crate::services::AuthTokens;

/// Sign-up request payload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com", format = "email")]
    pub email: String,
    /// Display name; the username is derived from it
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    #[schema(example = "John Doe", min_length = 3, max_length = 100)]
    pub name: String,
    #[validate(length(min = 8, max = 40, message = "Password must be between 8 and 40 characters"))]
    #[schema(example = "password123", format = "password", min_length = 8, max_length = 40)]
    pub password: String,
    #[schema(format = "password")]
    pub password_confirmation: String,
}

/// Sign-in request payload
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SignInRequest {
    /// Email address or username
    #[validate(length(min = 3, max = 255, message = "Email or username must be between 3 and 255 characters"))]
    #[schema(example = "user@example.com")]
    pub email_or_username: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    #[schema(example = "password123", format = "password")]
    pub password: String,
}

/// Refresh token request payload; also used by logout
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token cannot be empty"))]
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ConfirmEmailRequest {
    #[validate(length(min = 1, message = "Confirmation token cannot be empty"))]
    pub confirmation_token: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com", format = "email")]
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token cannot be empty"))]
    pub reset_token: String,
    #[validate(length(min = 8, max = 40, message = "Password must be between 8 and 40 characters"))]
    #[schema(format = "password", min_length = 8, max_length = 40)]
    pub password: String,
    #[schema(format = "password")]
    pub password_confirmation: String,
}

/// Password change; `old_password` may be omitted by accounts that never had one
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePasswordRequest {
    #[schema(format = "password")]
    pub old_password: Option<String>,
    #[validate(length(min = 8, max = 40, message = "Password must be between 8 and 40 characters"))]
    #[schema(format = "password", min_length = 8, max_length = 40)]
    pub password: String,
    #[schema(format = "password")]
    pub password_confirmation: String,
}

/// Query of the OAuth provider callback
#[derive(Debug, Deserialize, IntoParams)]
pub struct OAuthCallbackParams {
    pub code: String,
    pub state: String,
}

/// Issued tokens with the signed-in user
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: MeResponse,
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub access_token: String,
    #[schema(example = "eyJ0eXAiOiJKV1QiLCJhbGc...")]
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

impl AuthResponse {
    pub fn new(tokens: AuthTokens, providers: Vec<crate::models::OAuthProvider>) -> Self {
        Self {
            user: MeResponse::new(tokens.user, providers),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
