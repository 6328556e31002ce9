use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError, routes::require_session_id};

#[derive(Debug, Deserialize)]
pub struct AskInput {
    session_id: String,
    question: String,
}

/// Answers a question from the session's uploaded chunks. Always 200 once the
/// session id validates; pipeline failures arrive as textual answers.
pub async fn ask_question(
    State(state): State<ApiState>,
    Json(input): Json<AskInput>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = require_session_id(&input.session_id)?;
    state.sessions.touch(session_id).await;
    info!(%session_id, "Received question");

    let answer = state.qa.answer(&input.question, session_id).await;

    Ok(Json(json!({ "answer": answer })))
}
