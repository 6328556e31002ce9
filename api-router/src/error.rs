use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::AppError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize, Clone)]
pub enum ApiError {
    #[error("Internal server error")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Upload quota exceeded: {remaining} more file(s) allowed")]
    QuotaExceeded { remaining: usize },
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => Self::ValidationError(msg),
            AppError::QuotaExceeded { remaining } => Self::QuotaExceeded { remaining },
            AppError::UnsupportedFormat(name) => Self::UnsupportedFormat(name),
            _ => {
                tracing::error!("Internal error: {:?}", err);
                Self::InternalError("Internal server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            Self::ValidationError(_) | Self::UnsupportedFormat(_) | Self::QuotaExceeded { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
        };

        let error_response = ErrorResponse {
            error: message,
            status: "error".to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

#[derive(Serialize, Debug)]
struct ErrorResponse {
    error: String,
    status: String,
}
