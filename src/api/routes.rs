//! Router configuration for the API.
//!
//! Route groups are registered through `OpenApiRouter` so the OpenAPI
//! document is assembled from the handler annotations.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Layers run outermost first:
/// 1. Request ID - generates or propagates the request ID
/// 2. Logging - logs the request with its ID
/// 3. Error handler - reshapes non-JSON error responses
/// 4. Compression and CORS
///
/// # Routes
/// - `/api/health` - Health probes
/// - `/api/auth` - Sign-up, sign-in, tokens and OAuth
/// - `/api/me` - Current user
/// - `/api/users` - Public user lookups
/// - `/swagger-ui` - API explorer over `/api-docs/openapi.json`
pub fn create_router(state: AppState) -> Router {
    let api_routes = OpenApiRouter::new()
        .merge(handlers::health::health_routes())
        .nest("/auth", handlers::auth::auth_routes(&state))
        .nest("/me", handlers::me::me_routes(&state))
        .nest("/users", handlers::users::user_routes());

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes)
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
