use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde_json::json;
use tracing::info;

use common::error::AppError;
use ingestion_pipeline::UploadedFile;

use crate::{api_state::ApiState, error::ApiError, routes::require_session_id};

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    pub session_id: String,
    /// Raw text to ingest without a file, under the `manual` prefix.
    pub content: Option<String>,
    #[form_data(limit = "25MiB")]
    #[form_data(default)]
    pub files: Vec<FieldData<axum::body::Bytes>>,
}

pub async fn upload_documents(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = require_session_id(&input.session_id)?;
    state.sessions.touch(session_id).await;

    info!(
        %session_id,
        file_count = input.files.len(),
        has_content = input.content.as_ref().is_some_and(|c| !c.trim().is_empty()),
        "Received upload request"
    );

    let files = input
        .files
        .into_iter()
        .map(|field| {
            let filename = field
                .metadata
                .file_name
                .ok_or_else(|| AppError::Validation("uploaded file is missing a filename".into()))?;
            Ok(UploadedFile {
                filename,
                bytes: field.contents.to_vec(),
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let report = state
        .ingestion
        .ingest_batch(files, input.content, session_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "ingested_chunks": report.ingested_chunks,
            "files": report.files,
        })),
    ))
}
