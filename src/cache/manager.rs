//! Cache manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::memory::MemoryCache;
use crate::cache::noop::NoOpCache;
use crate::cache::redis::RedisCache;
use crate::cache::{AppCache, CacheError};
use crate::config::settings::{CacheBackend, CacheConfig};

/// Cache manager that provides access to the configured cache backend.
///
/// Cloning is cheap; the backend is shared.
#[derive(Clone)]
pub struct CacheManager {
    backend: Arc<dyn AppCache>,
    enabled: bool,
}

impl CacheManager {
    /// Create a new cache manager with the given configuration.
    ///
    /// If caching is disabled, a NoOpCache is used.
    pub async fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend: Arc<dyn AppCache> = if !config.enabled {
            Arc::new(NoOpCache::new())
        } else {
            match config.backend {
                CacheBackend::Memory => Arc::new(MemoryCache::new(&config.memory)),
                CacheBackend::Redis => Arc::new(RedisCache::new(&config.redis).await?),
            }
        };

        tracing::info!(
            enabled = config.enabled,
            backend = ?config.backend,
            "Cache initialized"
        );

        Ok(Self {
            backend,
            enabled: config.enabled,
        })
    }

    /// Wrap an existing backend.
    pub fn from_backend(backend: Arc<dyn AppCache>) -> Self {
        Self {
            backend,
            enabled: true,
        }
    }

    /// Check if caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Get a value from the cache.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.backend.get(key).await
    }

    /// Set a value in the cache.
    pub async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.backend.set(key, value, ttl).await
    }

    /// Remove a value from the cache.
    pub async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.backend.remove(key).await
    }

    /// Get and remove a value.
    pub async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.backend.take(key).await
    }

    /// Clear all values from the cache.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.backend.clear().await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl).await
    }

    pub async fn take_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.take(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
