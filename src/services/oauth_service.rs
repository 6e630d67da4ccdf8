//! OAuth sign-in: authorization redirect and provider callback.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

use crate::config::{OAuthClientConfig, OAuthSettings};
use crate::error::{AppError, AppResult};
use crate::external::oauth::{OAuthClient, OAuthEndpoints};
use crate::models::OAuthProvider;
use crate::services::auth_service::{AuthService, AuthTokens};
use crate::services::session_service::SessionService;
use crate::services::user_service::UserService;

#[derive(Clone)]
pub struct OAuthService {
    client: Arc<dyn OAuthClient>,
    providers: OAuthSettings,
    users: UserService,
    sessions: SessionService,
    auth: AuthService,
}

impl OAuthService {
    pub fn new(
        client: Arc<dyn OAuthClient>,
        providers: OAuthSettings,
        users: UserService,
        sessions: SessionService,
        auth: AuthService,
    ) -> Self {
        Self {
            client,
            providers,
            users,
            sessions,
            auth,
        }
    }

    /// Starts the flow: stores a fresh state and returns the provider URL.
    pub async fn authorization_url(&self, provider: OAuthProvider) -> AppResult<String> {
        let client = self.client_config(provider)?;
        let endpoints = OAuthEndpoints::resolve(provider, client)?;

        let state = generate_state();
        self.sessions.store_oauth_state(&state, provider).await?;
        endpoints.authorization_url(client, &state)
    }

    /// Completes the flow. The state is consumed whether or not it matches.
    pub async fn callback(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> AppResult<AuthTokens> {
        let client = self.client_config(provider)?;

        match self.sessions.take_oauth_state(state).await? {
            Some(expected) if expected == provider => {}
            _ => return Err(AppError::unauthorized("Invalid OAuth state")),
        }

        let profile = self.client.fetch_profile(provider, client, code).await?;
        let user = self
            .users
            .find_or_create(provider, &profile.email, &profile.name)
            .await?;

        tracing::info!(user_id = user.id, provider = %provider, "OAuth sign-in");
        self.auth.issue(user).await
    }

    fn client_config(&self, provider: OAuthProvider) -> AppResult<&OAuthClientConfig> {
        self.providers
            .client(provider)
            .ok_or_else(|| AppError::not_found("oauth_provider", "name", provider))
    }
}

fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
