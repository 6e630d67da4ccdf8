//! Error handler for converting AppError to HTTP responses.
//!
//! Every error leaves the API as an [`ErrorResponse`] with a stable `code`,
//! a message that never exposes internal sources, and the request ID when
//! one is in scope.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::request_id::current_request_id;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AppError::ConnectionPool { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Duplicate { .. } => "CONFLICT",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::UnprocessableContent { .. } => "UNPROCESSABLE_CONTENT",
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Forbidden { .. } => "FORBIDDEN",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

fn error_body(error: &AppError) -> ErrorResponse {
    let code = error_to_code(error);
    match error {
        AppError::NotFound {
            entity,
            field,
            value,
        } => ErrorResponse::new(code, format!("{entity} not found"))
            .with_details(json!({ "entity": entity, "field": field, "value": value })),
        AppError::Duplicate {
            entity,
            field,
            value,
        } => ErrorResponse::new(code, format!("{entity} with this {field} already exists"))
            .with_details(json!({ "entity": entity, "field": field, "value": value })),
        AppError::Validation { field, reason } => {
            ErrorResponse::new(code, format!("Invalid {field}: {reason}"))
                .with_details(json!({ "field": field, "reason": reason }))
        }
        AppError::ValidationErrors { errors } => {
            ErrorResponse::new(code, "Request validation failed")
                .with_details(json!({ "errors": errors }))
        }
        AppError::BadRequest { message }
        | AppError::UnprocessableContent { message }
        | AppError::Unauthorized { message }
        | AppError::Forbidden { message } => ErrorResponse::new(code, message.as_str()),
        AppError::Database { operation, .. } => {
            ErrorResponse::new(code, "A database error occurred")
                .with_details(json!({ "operation": operation }))
        }
        AppError::Configuration { .. } => ErrorResponse::new(code, "Server misconfigured"),
        AppError::ConnectionPool { .. } => {
            ErrorResponse::new(code, "Database connection unavailable")
        }
        AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let mut body = error_body(&self);
        if let Some(request_id) = current_request_id() {
            body = body.with_request_id(request_id);
        }

        (status, Json(body)).into_response()
    }
}

/// Rewrites error responses produced outside the handlers (unknown routes,
/// wrong methods, oversized bodies) into the standard JSON shape.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let original = match axum::body::to_bytes(body, 64 * 1024).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };

    let (code, fallback) = match status {
        StatusCode::BAD_REQUEST => ("BAD_REQUEST", "Bad request"),
        StatusCode::NOT_FOUND => ("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => ("METHOD_NOT_ALLOWED", "Method not allowed"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("UNSUPPORTED_MEDIA_TYPE", "Unsupported media type"),
        StatusCode::PAYLOAD_TOO_LARGE => ("PAYLOAD_TOO_LARGE", "Request payload too large"),
        StatusCode::UNPROCESSABLE_ENTITY => ("UNPROCESSABLE_CONTENT", "Unprocessable content"),
        s if s.is_server_error() => ("INTERNAL_ERROR", "An internal error occurred"),
        _ => ("ERROR", "Request failed"),
    };
    // Server error bodies may hold internals
    let message = if original.is_empty() || status.is_server_error() {
        fallback.to_string()
    } else {
        original
    };

    let mut body = ErrorResponse::new(code, message);
    if let Some(request_id) = current_request_id() {
        body = body.with_request_id(request_id);
    }

    let mut response = (status, Json(body)).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::routing::get;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    use super::*;
    use crate::error::ValidationFieldError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::not_found("user", "id", 1), StatusCode::NOT_FOUND),
            (AppError::duplicate("user", "email", "a@b.c"), StatusCode::CONFLICT),
            (AppError::bad_request("x"), StatusCode::BAD_REQUEST),
            (
                AppError::UnprocessableContent {
                    message: "x".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (
                AppError::Forbidden {
                    message: "x".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::ConnectionPool {
                    source: anyhow::anyhow!("down"),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error_to_status_code(&error), status, "{error}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_body() {
        let response = AppError::duplicate("user", "email", "a@b.c").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["details"]["field"], "email");
        assert!(json.get("request_id").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_body() {
        let error = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            }],
        };
        let json = body_json(error.into_response()).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["details"]["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let error = AppError::Database {
            operation: "insert user".to_string(),
            source: anyhow::anyhow!("password=hunter2"),
        };
        let json = body_json(error.into_response()).await;
        assert_eq!(json["message"], "A database error occurred");
        assert!(!json.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_global_handler_wraps_plain_errors() {
        let app = Router::new()
            .route("/plain", get(|| async { (StatusCode::BAD_REQUEST, "bad thing") }))
            .layer(middleware::from_fn(global_error_handler));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/plain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "BAD_REQUEST");
        assert_eq!(json["message"], "bad thing");

        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }
}
