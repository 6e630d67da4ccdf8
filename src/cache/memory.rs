//! Memory cache implementation using cached::SizedCache.
//!
//! `SizedCache` bounds the number of entries (LRU eviction); expiry is
//! tracked per entry so sessions and blacklist records can outlive the
//! default TTL.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cached::{Cached, SizedCache};

use crate::cache::{AppCache, CacheError};
use crate::config::settings::MemoryCacheConfig;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache with size limit and per-entry TTL.
pub struct MemoryCache {
    store: Mutex<SizedCache<String, Entry>>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(config: &MemoryCacheConfig) -> Self {
        Self {
            store: Mutex::new(SizedCache::with_size(config.max_size.max(1))),
            default_ttl: Duration::from_secs(config.ttl_seconds),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SizedCache<String, Entry>>, CacheError> {
        self.store
            .lock()
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

#[async_trait]
impl AppCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut store = self.lock()?;
        let now = Instant::now();

        let hit = store
            .cache_get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

        match hit {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                store.cache_remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        let expires_at = Instant::now() + ttl.unwrap_or(self.default_ttl);
        store.cache_set(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        store.cache_remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut store = self.lock()?;
        let now = Instant::now();
        Ok(store
            .cache_remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut store = self.lock()?;
        store.cache_clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_size: usize) -> MemoryCache {
        MemoryCache::new(&MemoryCacheConfig {
            max_size,
            ttl_seconds: 60,
        })
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let cache = cache(10);
        cache.set("a", b"1".to_vec(), None).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(b"1".to_vec()));

        cache.remove("a").await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_own_ttl() {
        let cache = cache(10);
        cache
            .set("short", b"x".to_vec(), Some(Duration::from_millis(20)))
            .await
            .unwrap();
        cache.set("long", b"y".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some(b"y".to_vec()));
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let cache = cache(10);
        cache.set("state", b"github".to_vec(), None).await.unwrap();

        assert_eq!(cache.take("state").await.unwrap(), Some(b"github".to_vec()));
        assert_eq!(cache.take("state").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_size_limit_evicts_least_recent() {
        let cache = cache(2);
        cache.set("a", b"1".to_vec(), None).await.unwrap();
        cache.set("b", b"2".to_vec(), None).await.unwrap();
        cache.set("c", b"3".to_vec(), None).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = cache(10);
        cache.set("a", b"1".to_vec(), None).await.unwrap();
        cache.clear().await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
    }
}
