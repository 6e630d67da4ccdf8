//! AppCache trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheError;

/// Trait for cache operations.
///
/// All cache backends must implement this trait to provide a unified interface.
/// A `ttl` of `None` falls back to the backend's configured default.
#[async_trait]
pub trait AppCache: Send + Sync {
    /// Get a value from the cache.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value in the cache with optional TTL override.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Remove a value from the cache.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Get a value and remove it in the same step.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.remove(key).await?;
        }
        Ok(value)
    }

    /// Clear all values from the cache.
    async fn clear(&self) -> Result<(), CacheError>;
}
