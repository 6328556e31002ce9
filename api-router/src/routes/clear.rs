use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use common::session::sweeper::purge_session;

use crate::{api_state::ApiState, error::ApiError, routes::require_session_id};

#[derive(Debug, Deserialize)]
pub struct ClearInput {
    session_id: String,
}

/// Removes the session's vectors, temp files and store entry. Idempotent;
/// clearing an unknown session succeeds.
pub async fn clear_session(
    State(state): State<ApiState>,
    Json(input): Json<ClearInput>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = require_session_id(&input.session_id)?;

    purge_session(
        &state.sessions,
        state.vectors.as_ref(),
        &state.upload_dir,
        session_id,
    )
    .await?;

    info!(%session_id, "Cleared session");

    Ok(Json(json!({
        "status": "cleared",
        "message": format!("Session {session_id} cleared: vectors and uploaded files removed."),
    })))
}
