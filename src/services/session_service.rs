//! Session presence, refresh-token blacklist and pending OAuth states.
//!
//! All three live in the cache under fixed key prefixes:
//! `sessions:{user_id}`, `blacklist:{jti}` and `oauth_state:{state}`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheManager;
use crate::config::AuthConfig;
use crate::error::AppResult;
use crate::models::OAuthProvider;
use crate::utils::jwt::Claims;

/// Presence record of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: i32,
    /// Unix seconds
    pub started_at: i64,
}

fn session_key(user_id: i32) -> String {
    format!("sessions:{user_id}")
}

fn blacklist_key(jti: &str) -> String {
    format!("blacklist:{jti}")
}

fn oauth_state_key(state: &str) -> String {
    format!("oauth_state:{state}")
}

#[derive(Clone, Debug)]
pub struct SessionService {
    cache: CacheManager,
    session_ttl: Duration,
    oauth_state_ttl: Duration,
}

impl SessionService {
    pub fn new(cache: CacheManager, config: &AuthConfig) -> Self {
        Self {
            cache,
            session_ttl: Duration::from_secs(config.session_ttl),
            oauth_state_ttl: Duration::from_secs(config.oauth_state_ttl),
        }
    }

    /// Records (or refreshes) the presence of `user_id`.
    pub async fn start(&self, user_id: i32) -> AppResult<()> {
        let record = SessionRecord {
            user_id,
            started_at: jiff::Timestamp::now().as_second(),
        };
        self.cache
            .set_json(&session_key(user_id), &record, Some(self.session_ttl))
            .await?;
        Ok(())
    }

    pub async fn end(&self, user_id: i32) -> AppResult<()> {
        self.cache.remove(&session_key(user_id)).await?;
        Ok(())
    }

    pub async fn is_active(&self, user_id: i32) -> AppResult<bool> {
        let record: Option<SessionRecord> = self.cache.get_json(&session_key(user_id)).await?;
        Ok(record.is_some())
    }

    /// Revokes a token until it would have expired anyway.
    pub async fn blacklist(&self, claims: &Claims) -> AppResult<()> {
        let remaining = claims.remaining_seconds();
        if remaining == 0 {
            return Ok(());
        }
        self.cache
            .set(
                &blacklist_key(&claims.jti),
                claims.sub.clone().into_bytes(),
                Some(Duration::from_secs(remaining)),
            )
            .await?;
        Ok(())
    }

    pub async fn is_blacklisted(&self, jti: &str) -> AppResult<bool> {
        Ok(self.cache.get(&blacklist_key(jti)).await?.is_some())
    }

    pub async fn store_oauth_state(&self, state: &str, provider: OAuthProvider) -> AppResult<()> {
        self.cache
            .set_json(&oauth_state_key(state), &provider, Some(self.oauth_state_ttl))
            .await?;
        Ok(())
    }

    /// Consumes a state; a second call for the same state returns `None`.
    pub async fn take_oauth_state(&self, state: &str) -> AppResult<Option<OAuthProvider>> {
        Ok(self.cache.take_json(&oauth_state_key(state)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::utils::jwt::TokenType;

    async fn service(enabled: bool) -> SessionService {
        let cache = CacheManager::new(&CacheConfig {
            enabled,
            ..Default::default()
        })
        .await
        .unwrap();
        SessionService::new(cache, &AuthConfig::default())
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let sessions = service(true).await;
        assert!(!sessions.is_active(1).await.unwrap());

        sessions.start(1).await.unwrap();
        assert!(sessions.is_active(1).await.unwrap());
        assert!(!sessions.is_active(2).await.unwrap());

        sessions.end(1).await.unwrap();
        assert!(!sessions.is_active(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_blacklist() {
        let sessions = service(true).await;
        let claims = Claims::new(1, 0, TokenType::Refresh, 1);

        assert!(!sessions.is_blacklisted(&claims.jti).await.unwrap());
        sessions.blacklist(&claims).await.unwrap();
        assert!(sessions.is_blacklisted(&claims.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_token_is_not_stored() {
        let sessions = service(true).await;
        let claims = Claims::new(1, 0, TokenType::Refresh, -1);

        sessions.blacklist(&claims).await.unwrap();
        assert!(!sessions.is_blacklisted(&claims.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_oauth_state_is_single_use() {
        let sessions = service(true).await;
        sessions
            .store_oauth_state("abc", OAuthProvider::Github)
            .await
            .unwrap();

        assert_eq!(
            sessions.take_oauth_state("abc").await.unwrap(),
            Some(OAuthProvider::Github)
        );
        assert_eq!(sessions.take_oauth_state("abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disabled_cache_has_no_presence() {
        let sessions = service(false).await;
        sessions.start(1).await.unwrap();
        assert!(!sessions.is_active(1).await.unwrap());
    }
}
