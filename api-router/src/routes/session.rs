use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::api_state::ApiState;

/// Creates a fresh session. Never fails.
pub async fn create_session(State(state): State<ApiState>) -> impl IntoResponse {
    let session_id = state.sessions.create_session().await;
    info!(%session_id, "Created session");

    (StatusCode::OK, Json(json!({ "session_id": session_id })))
}
