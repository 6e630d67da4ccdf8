//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod auth;
pub mod health;
pub mod me;
pub mod users;

use crate::api::dto::{AuthResponse, MeResponse};
use crate::error::AppResult;
use crate::models::User;
use crate::services::AuthTokens;
use crate::state::AppState;

/// Private view of `user`, with its linked providers.
pub(crate) async fn me_response(state: &AppState, user: User) -> AppResult<MeResponse> {
    let providers = state.services.users.providers(user.id).await?;
    Ok(MeResponse::new(user, providers))
}

pub(crate) async fn auth_response(state: &AppState, tokens: AuthTokens) -> AppResult<AuthResponse> {
    let providers = state.services.users.providers(tokens.user.id).await?;
    Ok(AuthResponse::new(tokens, providers))
}
