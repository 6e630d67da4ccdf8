//! Health check endpoint handlers.
//!
//! Probes talk to the database pool and the cache directly rather than
//! going through the service layer.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use axum::{extract::State, http::StatusCode, response::Json};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::state::AppState;

const CACHE_PROBE_KEY: &str = "health:probe";

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Component report
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Component health report
///
/// Database failures make the service unhealthy; cache failures only
/// degrade it.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = HEALTH_TAG
)]
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let response = collect_checks(&state).await;
    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(response))
}

/// Readiness probe
///
/// Ready only when every component is healthy.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    match collect_checks(&state).await.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded | HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive")
    ),
    tag = HEALTH_TAG
)]
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

async fn collect_checks(state: &AppState) -> HealthResponse {
    let mut checks = BTreeMap::new();
    checks.insert("database".to_string(), check_database(state).await);
    checks.insert("cache".to_string(), check_cache(state).await);
    HealthResponse::from_checks(&state.settings.application.version, checks)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

async fn check_database(state: &AppState) -> ComponentHealth {
    let start = Instant::now();

    let Some(pool) = &state.db_pool else {
        return ComponentHealth::new(HealthStatus::Unhealthy, "Not configured", 0);
    };

    match pool.get().await {
        Ok(mut conn) => {
            use diesel_async::RunQueryDsl;

            match diesel::sql_query("SELECT 1").execute(&mut conn).await {
                Ok(_) => ComponentHealth::new(HealthStatus::Healthy, "Connected", elapsed_ms(start)),
                Err(e) => ComponentHealth::new(
                    HealthStatus::Unhealthy,
                    format!("Query failed: {e}"),
                    elapsed_ms(start),
                ),
            }
        }
        Err(e) => ComponentHealth::new(
            HealthStatus::Unhealthy,
            format!("Connection failed: {e}"),
            elapsed_ms(start),
        ),
    }
}

/// Sessions and token revocation live in the cache, so a disabled cache
/// counts as degraded.
async fn check_cache(state: &AppState) -> ComponentHealth {
    let start = Instant::now();

    if !state.cache.is_enabled() {
        return ComponentHealth::new(HealthStatus::Degraded, "Disabled", 0);
    }

    let probe = async {
        state
            .cache
            .set(CACHE_PROBE_KEY, b"ok".to_vec(), Some(Duration::from_secs(10)))
            .await?;
        state.cache.get(CACHE_PROBE_KEY).await
    };

    match probe.await {
        Ok(Some(_)) => ComponentHealth::new(HealthStatus::Healthy, "Connected", elapsed_ms(start)),
        Ok(None) => ComponentHealth::new(
            HealthStatus::Degraded,
            "Probe value missing",
            elapsed_ms(start),
        ),
        Err(e) => ComponentHealth::new(
            HealthStatus::Degraded,
            format!("Cache error: {e}"),
            elapsed_ms(start),
        ),
    }
}
