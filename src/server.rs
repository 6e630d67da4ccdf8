//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::api::routes::create_router;
use crate::cache::CacheManager;
use crate::config::{Environment, Settings};
use crate::db::{MigrationAction, establish_async_connection_pool, run_migrations};
use crate::external::oauth::HttpOAuthClient;
use crate::external::storage::{S3Uploader, Uploader};
use crate::jobs;
use crate::repositories::UserRepository;
use crate::services::mail::MailService;
use crate::services::{Backends, Services};
use crate::state::AppState;

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Initializes the database pool, cache, storage and mail backends
    /// 3. Starts the background job workers
    /// 4. Binds to the configured address and serves until a shutdown signal
    /// 5. Stops the job workers
    ///
    /// # Errors
    /// - Database, cache or storage initialization errors
    /// - Address binding errors
    /// - Server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            environment = %Environment::from_env().as_str(),
            "Application starting"
        );

        tracing::info!(
            host = %settings.server.host,
            port = %settings.server.port,
            request_timeout = %settings.server.request_timeout,
            keep_alive_timeout = %settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        // Database URL stays out of the logs
        tracing::info!(
            max_connections = %settings.database.max_connections,
            min_connections = %settings.database.min_connections,
            connection_timeout = %settings.database.connection_timeout,
            auto_migrate = %settings.database.auto_migrate,
            "Database configuration loaded"
        );

        tracing::info!(
            access_token_expiration = %settings.jwt.access_token_expiration,
            refresh_token_expiration = %settings.jwt.refresh_token_expiration,
            secret_configured = %(!settings.jwt.secret.is_empty()),
            "JWT configuration loaded"
        );

        settings.jwt.validate().map_err(|e| {
            tracing::error!(error = %e, "JWT configuration validation failed");
            anyhow::anyhow!("JWT configuration validation failed: {}", e)
        })?;

        if settings.database.auto_migrate {
            let applied = run_migrations(&settings.database.url, MigrationAction::Up).await?;
            tracing::info!(count = applied.len(), "Database migrations applied");
        }

        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&settings.database).await?;
        tracing::info!("Database connection pool initialized");

        let cache = CacheManager::new(&settings.cache).await?;
        let uploader: Arc<dyn Uploader> = Arc::new(S3Uploader::new(&settings.storage).await?);
        let mailer = MailService::provider_from_config(&settings.mail)?;
        tracing::info!(provider = mailer.name(), "Mail provider configured");

        let shutdown = CancellationToken::new();
        let (queue, workers) = jobs::start(&settings.jobs, uploader.clone(), shutdown.clone());

        let services = Services::new(
            &settings,
            Backends {
                store: Arc::new(UserRepository::new(pool.clone())),
                cache: cache.clone(),
                uploader,
                oauth_client: Arc::new(HttpOAuthClient),
                mailer,
                jobs: queue,
            },
        );

        let address = settings.server.address();
        let state = AppState::new(services, Arc::new(settings), cache, Some(pool));
        let router = create_router(state);
        tracing::info!("Router configured");

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Workers finish their current attempt before exiting
        shutdown.cancel();
        for worker in workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Job worker ended abnormally");
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
