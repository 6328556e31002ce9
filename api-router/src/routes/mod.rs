pub mod ask;
pub mod clear;
pub mod files;
pub mod liveness;
pub mod session;
pub mod upload;

use common::error::AppError;

/// Missing or blank session ids are a client error on every endpoint.
pub(crate) fn require_session_id(session_id: &str) -> Result<&str, AppError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(AppError::Validation("session_id is required".to_string()));
    }
    Ok(session_id)
}
