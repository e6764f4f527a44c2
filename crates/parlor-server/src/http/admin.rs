//! Admin console endpoints: credential check, session list, session delete.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::AppState;
use super::error::ApiError;

/// Body of `POST /api/admin/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Candidate shared secret.
    pub password: String,
}

/// Check the admin shared secret.
///
/// Always responds 200; the body carries the verdict. This is a UI gate,
/// not a security boundary.
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Json<Value> {
    let success = body.password == *state.admin_password;
    Json(json!({ "success": success }))
}

/// List sessions with their last-message time, newest activity first.
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sessions = state.store.list_sessions()?;
    Ok(Json(json!({ "sessions": sessions })))
}

/// Delete a session's entire transcript and clear its push registration.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.store.delete_session(&session_id)?;
    info!(session_id, deleted, "session deleted by admin");
    Ok(Json(json!({ "success": true })))
}
