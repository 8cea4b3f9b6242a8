//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CatalogError, CheckoutError};
use event_store::EventStoreError;
use thiserror::Error;

/// Where anonymous callers are sent to sign in.
pub const LOGIN_PATH: &str = "/login";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path, header or body.
    BadRequest(String),
    /// Checkout engine error.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, serde_json::Value) {
    let message = err.to_string();
    match err {
        CheckoutError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({ "error": message, "fields": errors }),
        ),
        CheckoutError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": message }),
        ),
        CheckoutError::AuthenticationRequired => (
            StatusCode::UNAUTHORIZED,
            serde_json::json!({ "error": message, "login": LOGIN_PATH }),
        ),
        CheckoutError::Authorization { .. } => (
            StatusCode::FORBIDDEN,
            serde_json::json!({ "error": message }),
        ),
        CheckoutError::InvalidState(_)
        | CheckoutError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => (
            StatusCode::CONFLICT,
            serde_json::json!({ "error": message }),
        ),
        _ => {
            tracing::error!(error = %message, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": message }),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

/// Failures while bringing the server up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Failed to load catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
