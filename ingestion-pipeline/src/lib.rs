#![allow(clippy::missing_docs_in_private_items)]

pub mod chunking;
pub mod extraction;
pub mod pipeline;

pub use pipeline::{IngestReport, IngestionPipeline, UploadedFile};
