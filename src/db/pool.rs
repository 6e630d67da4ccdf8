//! Async database connection pool implementation.
//!
//! Uses bb8 connection pool manager with diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Async connection pool type alias.
///
/// bb8::Pool internally uses Arc, so Clone is cheap (just reference count increment).
/// Structures holding AsyncDbPool can derive Clone without additional Arc wrapping.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Migrations compiled into the binary from `migrations/`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates an async database connection pool from configuration.
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await
        .map_err(|e| AppError::ConnectionPool {
            source: anyhow::Error::new(e).context("Failed to build database pool"),
        })
}

/// What a migration run should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationAction {
    /// Apply every pending migration
    Up,
    /// Revert the given number of applied migrations
    Rollback(usize),
    /// Only report pending migrations
    Pending,
}

/// Runs embedded migrations against `database_url`.
///
/// Returns the versions that were applied, reverted, or are pending.
pub async fn run_migrations(database_url: &str, action: MigrationAction) -> AppResult<Vec<String>> {
    let database_url = database_url.to_string();

    // The migration harness is synchronous; run it off the async runtime
    tokio::task::spawn_blocking(move || {
        use diesel::Connection;

        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)
            .map_err(|e| AppError::Database {
                operation: "connect for migrations".to_string(),
                source: anyhow::Error::new(e),
            })?;

        let migration_error = |operation: &str, e: Box<dyn std::error::Error + Send + Sync>| {
            AppError::Database {
                operation: operation.to_string(),
                source: anyhow::anyhow!(e),
            }
        };

        match action {
            MigrationAction::Up => conn
                .run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.iter().map(ToString::to_string).collect())
                .map_err(|e| migration_error("run migrations", e)),
            MigrationAction::Pending => conn
                .pending_migrations(MIGRATIONS)
                .map(|migrations| {
                    migrations
                        .iter()
                        .map(|m| m.name().to_string())
                        .collect()
                })
                .map_err(|e| migration_error("list pending migrations", e)),
            MigrationAction::Rollback(steps) => {
                let mut reverted = Vec::with_capacity(steps);
                for _ in 0..steps {
                    let version = conn
                        .revert_last_migration(MIGRATIONS)
                        .map_err(|e| migration_error("revert migration", e))?;
                    reverted.push(version.to_string());
                }
                Ok(reverted)
            }
        }
    })
    .await
    .map_err(AppError::internal)?
}
