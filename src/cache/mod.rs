//! Cache module providing runtime-configurable caching with multiple backends.
//!
//! Sessions, the refresh-token blacklist and pending OAuth states are kept
//! here. Supported backends:
//! - Memory cache (in-process, per-entry expiry)
//! - Redis cache (distributed, shared between instances)
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"  # or "redis"
//!
//! [cache.memory]
//! max_size = 10000
//! ttl_seconds = 3600
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! ttl_seconds = 3600
//! pool_size = 10
//! connection_timeout = 5
//! key_prefix = "accounts:"
//! tls_enabled = false
//! ```
//!
//! When `enabled = false` a no-op backend is used and every read misses.

mod error;
mod manager;
mod memory;
mod noop;
mod redis;
mod traits;

pub use error::CacheError;
pub use manager::CacheManager;
pub use memory::MemoryCache;
pub use noop::NoOpCache;
pub use traits::AppCache;
