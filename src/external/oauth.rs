//! OAuth2 authorization-code client for the supported identity providers.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::OAuthClientConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;
use crate::models::OAuthProvider;

/// Identity returned by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub email: String,
    pub name: String,
}

/// Endpoint set of a provider, after applying configured overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
}

impl OAuthEndpoints {
    /// Provider defaults, overridden field by field from `client`.
    pub fn resolve(provider: OAuthProvider, client: &OAuthClientConfig) -> AppResult<Self> {
        let (authorize, token, userinfo, scopes): (&str, &str, &str, &[&str]) = match provider {
            OAuthProvider::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth",
                "https://oauth2.googleapis.com/token",
                "https://openidconnect.googleapis.com/v1/userinfo",
                &["openid", "email", "profile"],
            ),
            OAuthProvider::Facebook => (
                "https://www.facebook.com/v19.0/dialog/oauth",
                "https://graph.facebook.com/v19.0/oauth/access_token",
                "https://graph.facebook.com/me?fields=email,name",
                &["email", "public_profile"],
            ),
            OAuthProvider::Github => (
                "https://github.com/login/oauth/authorize",
                "https://github.com/login/oauth/access_token",
                "https://api.github.com/user",
                &["read:user", "user:email"],
            ),
            OAuthProvider::Microsoft => (
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
                "https://login.microsoftonline.com/common/oauth2/v2.0/token",
                "https://graph.microsoft.com/v1.0/me",
                &["openid", "email", "profile", "User.Read"],
            ),
            OAuthProvider::Local => {
                return Err(AppError::not_found("oauth_provider", "name", provider));
            }
        };

        Ok(Self {
            authorize_url: client.authorize_url.clone().unwrap_or_else(|| authorize.to_string()),
            token_url: client.token_url.clone().unwrap_or_else(|| token.to_string()),
            userinfo_url: client.userinfo_url.clone().unwrap_or_else(|| userinfo.to_string()),
            scopes: if client.scopes.is_empty() {
                scopes.iter().map(ToString::to_string).collect()
            } else {
                client.scopes.clone()
            },
        })
    }

    /// Authorization URL the browser is redirected to.
    pub fn authorization_url(&self, client: &OAuthClientConfig, state: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.authorize_url).map_err(AppError::internal)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &client.client_id)
            .append_pair("redirect_uri", &client.redirect_url)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }
}

/// Exchanges authorization codes for user profiles.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    async fn fetch_profile(
        &self,
        provider: OAuthProvider,
        client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<OAuthProfile>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// OAuth client over the shared HTTP client.
#[derive(Debug, Clone, Default)]
pub struct HttpOAuthClient;

impl HttpOAuthClient {
    async fn exchange_code(
        &self,
        endpoints: &OAuthEndpoints,
        client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<String> {
        let response = HTTP_CLIENT
            .post(&endpoints.token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", client.redirect_url.as_str()),
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(AppError::internal)?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "OAuth code exchange rejected");
            return Err(AppError::unauthorized("Invalid authorization code"));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| AppError::unauthorized("Invalid authorization code"))?;
        Ok(token.access_token)
    }

    async fn get_json(&self, url: &str, access_token: &str) -> AppResult<JsonValue> {
        let response = HTTP_CLIENT
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(AppError::internal)?
            .error_for_status()
            .map_err(AppError::internal)?;

        response.json().await.map_err(AppError::internal)
    }

    /// GitHub hides private emails from `/user`; ask the emails endpoint.
    async fn github_primary_email(&self, access_token: &str) -> AppResult<Option<String>> {
        let emails: Vec<GithubEmail> = serde_json::from_value(
            self.get_json("https://api.github.com/user/emails", access_token)
                .await?,
        )
        .map_err(AppError::internal)?;

        Ok(emails
            .into_iter()
            .find(|email| email.primary && email.verified)
            .map(|email| email.email))
    }
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    async fn fetch_profile(
        &self,
        provider: OAuthProvider,
        client: &OAuthClientConfig,
        code: &str,
    ) -> AppResult<OAuthProfile> {
        let endpoints = OAuthEndpoints::resolve(provider, client)?;
        let access_token = self.exchange_code(&endpoints, client, code).await?;
        let mut body = self.get_json(&endpoints.userinfo_url, &access_token).await?;

        if provider == OAuthProvider::Github
            && body.get("email").and_then(JsonValue::as_str).is_none()
            && let Some(email) = self.github_primary_email(&access_token).await?
            && let Some(object) = body.as_object_mut()
        {
            object.insert("email".to_string(), JsonValue::String(email));
        }

        profile_from_json(provider, &body)
            .ok_or_else(|| AppError::unauthorized("Provider did not return an email address"))
    }
}

/// Picks email and display name out of a provider's userinfo document.
pub fn profile_from_json(provider: OAuthProvider, body: &JsonValue) -> Option<OAuthProfile> {
    let field = |key: &str| {
        body.get(key)
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let (email, name) = match provider {
        OAuthProvider::Microsoft => (
            field("mail").or_else(|| field("userPrincipalName")),
            field("displayName"),
        ),
        OAuthProvider::Github => (field("email"), field("name").or_else(|| field("login"))),
        _ => (field("email"), field("name")),
    };

    let email = email?.to_lowercase();
    let name = name
        .map(ToString::to_string)
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    Some(OAuthProfile { email, name })
}
