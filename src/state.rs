//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::cache::CacheManager;
use crate::config::Settings;
use crate::db::AsyncDbPool;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    pub settings: Arc<Settings>,
    /// Probed by the health checks
    pub cache: CacheManager,
    /// Probed by the health checks; `None` when running without a database
    pub db_pool: Option<AsyncDbPool>,
}

impl AppState {
    pub fn new(
        services: Services,
        settings: Arc<Settings>,
        cache: CacheManager,
        db_pool: Option<AsyncDbPool>,
    ) -> Self {
        Self {
            services,
            settings,
            cache,
            db_pool,
        }
    }
}
