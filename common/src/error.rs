use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upload quota exceeded: {remaining} more file(s) allowed")]
    QuotaExceeded { remaining: usize },
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Vector store error: {0}")]
    VectorStore(String),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Processing error: {0}")]
    Processing(String),
}
