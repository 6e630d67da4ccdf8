//! Redis cache backend over a bb8 connection pool.
//!
//! Every key is namespaced with `key_prefix`, so `clear` only touches this
//! application's entries.

use std::time::Duration;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use redis::{AsyncCommands, Client, RedisError};

use crate::cache::{AppCache, CacheError};
use crate::config::settings::RedisCacheConfig;

fn operation_error(error: RedisError) -> CacheError {
    CacheError::Operation(error.to_string())
}

/// Upgrades a plain `redis://` URL to `rediss://` when TLS is requested.
fn connection_url(config: &RedisCacheConfig) -> std::borrow::Cow<'_, str> {
    match config.url.strip_prefix("redis://") {
        Some(rest) if config.tls_enabled => format!("rediss://{rest}").into(),
        _ => config.url.as_str().into(),
    }
}

pub struct RedisCache {
    pool: Pool<Client>,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisCache {
    pub async fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(connection_url(config).as_ref())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .build(client)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
            default_ttl: config.ttl_seconds,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Expiry in whole seconds; SETEX rejects zero.
    fn expiry_secs(&self, ttl: Option<Duration>) -> u64 {
        ttl.map_or(self.default_ttl, |ttl| ttl.as_secs()).max(1)
    }

    async fn conn(&self) -> Result<PooledConnection<'_, Client>, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl AppCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn().await?;
        conn.get(self.key(key)).await.map_err(operation_error)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.set_ex::<_, _, ()>(self.key(key), value, self.expiry_secs(ttl))
            .await
            .map_err(operation_error)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(self.key(key)).await.map_err(operation_error)
    }

    /// Atomic read-and-delete, so an OAuth state can be used once.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn().await?;
        conn.get_del(self.key(key)).await.map_err(operation_error)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        let keys: Vec<String> = conn
            .keys(format!("{}*", self.key_prefix))
            .await
            .map_err(operation_error)?;

        if keys.is_empty() {
            return Ok(());
        }
        conn.del::<_, ()>(keys).await.map_err(operation_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconnected(prefix: &str, default_ttl: u64) -> RedisCache {
        let client = Client::open("redis://127.0.0.1:6379").unwrap();
        RedisCache {
            pool: Pool::builder().build_unchecked(client),
            key_prefix: prefix.to_string(),
            default_ttl,
        }
    }

    #[tokio::test]
    async fn test_keys_are_prefixed() {
        let cache = unconnected("accounts:", 60);
        assert_eq!(cache.key("sessions:7"), "accounts:sessions:7");
    }

    #[test]
    fn test_tls_upgrades_scheme() {
        let mut config = RedisCacheConfig {
            url: "redis://cache:6379/0".to_string(),
            ..Default::default()
        };
        assert_eq!(connection_url(&config), "redis://cache:6379/0");
        config.tls_enabled = true;
        assert_eq!(connection_url(&config), "rediss://cache:6379/0");
        config.url = "rediss://cache:6380".to_string();
        assert_eq!(connection_url(&config), "rediss://cache:6380");
    }

    #[tokio::test]
    async fn test_expiry_never_zero() {
        let cache = unconnected("accounts:", 60);
        assert_eq!(cache.expiry_secs(None), 60);
        assert_eq!(cache.expiry_secs(Some(Duration::from_secs(5))), 5);
        assert_eq!(cache.expiry_secs(Some(Duration::from_millis(10))), 1);
    }
}
