use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{api_state::ApiState, error::ApiError, routes::require_session_id};

#[derive(Debug, Deserialize)]
pub struct FilesParams {
    #[serde(default)]
    session_id: String,
}

/// Lists the session's uploaded filenames; empty for unknown sessions.
pub async fn list_files(
    State(state): State<ApiState>,
    Query(params): Query<FilesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = require_session_id(&params.session_id)?;
    state.sessions.touch(session_id).await;

    let files = state.sessions.list_files(session_id).await;

    Ok(Json(json!({ "files": files })))
}
