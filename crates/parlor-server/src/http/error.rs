//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Errors surfaced by the REST handlers.
///
/// Clients get a fixed `{"error": "Database error"}` body; the underlying
/// cause goes to the log, not the wire.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] parlor_store::StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Database error" })),
                )
                    .into_response()
            }
        }
    }
}
