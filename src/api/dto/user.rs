//! User-related DTOs for API requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{OAuthProvider, OnlineStatus, User};
use crate::utils::slug::USERNAME_REGEX;

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateNameRequest {
    #[validate(length(min = 3, max = 100, message = "Name must be between 3 and 100 characters"))]
    #[schema(example = "John Doe", min_length = 3, max_length = 100)]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateUsernameRequest {
    #[validate(length(min = 3, max = 106, message = "Username must be between 3 and 106 characters"))]
    #[validate(regex(path = *USERNAME_REGEX, message = "Username may only contain letters and digits joined by single dots or dashes"))]
    #[schema(example = "john-doe", min_length = 3, max_length = 106)]
    pub username: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new@example.com", format = "email")]
    pub email: String,
    #[schema(format = "password")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    #[schema(format = "password")]
    pub password: String,
}

/// Either field may be omitted; `online_status` only applies with an active session
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateOnlineStatusRequest {
    pub online_status: Option<OnlineStatus>,
    pub default_status: Option<OnlineStatus>,
}

/// Query of the picture upload; the image itself is the raw request body
#[derive(Debug, Deserialize, IntoParams)]
pub struct PictureParams {
    /// Width over height, in (0, 10]
    #[param(example = 1.0)]
    pub ratio: f64,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Public view of a user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "john-doe")]
    pub username: String,
    #[schema(example = "John Doe")]
    pub name: String,
    pub picture: Option<String>,
    pub online_status: OnlineStatus,
    /// RFC 3339
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            picture: user.picture,
            online_status: user.online_status,
            created_at: jiff::Timestamp::from(user.created_at).to_string(),
        }
    }
}

/// The signed-in user's own account.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserResponse,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub confirmed: bool,
    pub default_status: OnlineStatus,
    pub providers: Vec<OAuthProvider>,
    pub updated_at: String,
}

impl MeResponse {
    pub fn new(user: User, providers: Vec<OAuthProvider>) -> Self {
        let email = user.email.clone();
        let confirmed = user.confirmed;
        let default_status = user.default_status;
        let updated_at = jiff::Timestamp::from(user.updated_at).to_string();
        Self {
            profile: UserResponse::from(user),
            email,
            confirmed,
            default_status,
            providers,
            updated_at,
        }
    }
}
