//! Push token registration endpoint.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::AppState;
use super::error::ApiError;

/// Body of `POST /api/push/register`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Session the device belongs to.
    pub session_id: String,
    /// Opaque device token.
    pub token: String,
}

/// Register or replace a session's device token (last write wins).
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    state.store.register_push_token(&body.session_id, &body.token)?;
    debug!(session_id = %body.session_id, "push token registered");
    Ok(Json(json!({ "success": true })))
}
