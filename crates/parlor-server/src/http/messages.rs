//! Transcript read endpoint.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use super::AppState;
use super::error::ApiError;

/// List a session's messages in creation order. Unknown sessions yield an
/// empty list, matching the implicit-creation model.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let messages = state.store.list_messages(&session_id)?;
    Ok(Json(json!({ "messages": messages })))
}
