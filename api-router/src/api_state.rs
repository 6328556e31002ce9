use std::{path::PathBuf, sync::Arc};

use common::{
    session::SessionStore,
    utils::config::AppConfig,
    vector::VectorStore,
};
use ingestion_pipeline::IngestionPipeline;
use retrieval_pipeline::QaPipeline;

/// Everything the request handlers need, shared by `Arc` rather than ambient
/// state so the sweeper and handlers see the same stores.
#[derive(Clone)]
pub struct ApiState {
    pub sessions: Arc<SessionStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub ingestion: Arc<IngestionPipeline>,
    pub qa: Arc<QaPipeline>,
    pub upload_dir: PathBuf,
    pub config: AppConfig,
}

impl ApiState {
    pub fn new(
        sessions: Arc<SessionStore>,
        vectors: Arc<dyn VectorStore>,
        ingestion: Arc<IngestionPipeline>,
        qa: Arc<QaPipeline>,
        config: AppConfig,
    ) -> Self {
        Self {
            sessions,
            vectors,
            ingestion,
            qa,
            upload_dir: PathBuf::from(&config.upload_dir),
            config,
        }
    }
}
