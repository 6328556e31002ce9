#![allow(clippy::missing_docs_in_private_items)]

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use api_state::ApiState;
use routes::{
    ask::ask_question,
    clear::clear_session,
    files::list_files,
    liveness::{live, ready},
    session::create_session,
    upload::upload_documents,
};

pub mod api_state;
pub mod error;
mod routes;

/// Builds the HTTP surface: session lifecycle, upload, ask, list, clear,
/// plus unauthenticated probes for process supervisors.
pub fn api_routes(state: ApiState) -> Router {
    let body_limit = state.config.upload_max_body_bytes;

    Router::new()
        .route("/session", post(create_session))
        .route(
            "/upload",
            post(upload_documents).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/ask", post(ask_question))
        .route("/files", get(list_files))
        .route("/clear_session", post(clear_session))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(state)
}
