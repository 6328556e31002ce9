use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::OnceCell;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{debug, info};

use crate::error::AppError;

use super::{ChunkMetadata, ScoredChunk, VectorRecord, VectorStore, UPSERT_BATCH_SIZE};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const READY_POLL_INTERVAL_MS: u64 = 2_000;
const READY_POLL_ATTEMPTS: usize = 30;

/// Vector store backed by the Pinecone REST API.
///
/// The control plane is only used by `ensure_index`; data-plane calls go to
/// the index host, which is resolved once and cached.
pub struct PineconeStore {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    cloud: String,
    region: String,
    dimension: usize,
    host: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    status: IndexStatus,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<ChunkMetadata>,
}

impl PineconeStore {
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        cloud: impl Into<String>,
        region: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            index_name: index_name.into(),
            cloud: cloud.into(),
            region: region.into(),
            dimension,
            host: OnceCell::new(),
        }
    }

    async fn describe_index(&self) -> Result<Option<IndexDescription>, AppError> {
        let response = self
            .client
            .get(format!("{CONTROL_PLANE_URL}/indexes/{}", self.index_name))
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    async fn create_index(&self) -> Result<(), AppError> {
        info!(index = %self.index_name, dimension = self.dimension, "Creating vector index");
        let body = json!({
            "name": self.index_name,
            "dimension": self.dimension,
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });

        let response = self
            .client
            .post(format!("{CONTROL_PLANE_URL}/indexes"))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        // A concurrent creator winning the race is fine.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }

        check_status(response).await?;
        Ok(())
    }

    async fn resolve_host(&self) -> Result<&str, AppError> {
        self.host
            .get_or_try_init(|| async {
                let strategy =
                    FixedInterval::from_millis(READY_POLL_INTERVAL_MS).take(READY_POLL_ATTEMPTS);
                let description = Retry::spawn(strategy, || async {
                    match self.describe_index().await? {
                        Some(description) if description.status.ready => Ok(description),
                        Some(_) => Err(AppError::VectorStore(format!(
                            "index {} is not ready yet",
                            self.index_name
                        ))),
                        None => Err(AppError::VectorStore(format!(
                            "index {} does not exist",
                            self.index_name
                        ))),
                    }
                })
                .await?;
                Ok::<_, AppError>(format!("https://{}", description.host))
            })
            .await
            .map(String::as_str)
    }

    async fn data_plane_post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, AppError> {
        let host = self.resolve_host().await?;
        let response = self
            .client
            .post(format!("{host}{path}"))
            .header("Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn ensure_index(&self) -> Result<(), AppError> {
        if self.describe_index().await?.is_none() {
            self.create_index().await?;
        }
        // Resolving the host waits until the index reports ready.
        self.resolve_host().await?;
        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), AppError> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            debug!(count = batch.len(), "Upserting vector batch");
            self.data_plane_post("/vectors/upsert", json!({ "vectors": batch }))
                .await?;
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        session_id: &str,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "filter": { "session_id": { "$eq": session_id } },
        });

        let response: QueryResponse = self.data_plane_post("/query", body).await?.json().await?;

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|metadata| ScoredChunk {
                    id: m.id,
                    score: m.score,
                    metadata,
                })
            })
            .collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let body = json!({
            "filter": { "session_id": { "$eq": session_id } },
        });
        self.data_plane_post("/vectors/delete", body).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::VectorStore(format!(
        "pinecone returned {status}: {body}"
    )))
}
