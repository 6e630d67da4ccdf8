//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `auth` - Sign-up, sign-in, token and password DTOs
//! - `user` - Profile request/response DTOs
//! - `error` - Common error response DTOs
//! - `pagination` - Cursor pagination DTOs
//! - `health` - Health check DTOs

mod auth;
mod error;
mod health;
mod pagination;
mod user;

pub use auth::{
    AuthResponse, ConfirmEmailRequest, ForgotPasswordRequest, MessageResponse,
    OAuthCallbackParams, RefreshTokenRequest, ResetPasswordRequest, SignInRequest,
    SignUpRequest, UpdatePasswordRequest,
};
pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use pagination::{PageInfoResponse, UserEdge, UserPageResponse, UserQueryParams};
pub use user::{
    DeleteAccountRequest, MeResponse, PictureParams, UpdateEmailRequest, UpdateNameRequest,
    UpdateOnlineStatusRequest, UpdateUsernameRequest, UserResponse,
};
