use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::AppError;

use super::{ChunkMetadata, ScoredChunk, VectorRecord, VectorStore};

/// Process-local vector store with exact cosine scoring.
///
/// Used by the test suite and as a standalone backend for single-process
/// deployments that don't want an external database.
pub struct InMemoryVectorStore {
    dimension: usize,
    records: Mutex<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_index(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), AppError> {
        let mut guard = self.records.lock().await;
        for record in records {
            if record.values.len() != self.dimension {
                return Err(AppError::VectorStore(format!(
                    "vector {} has dimension {}, index expects {}",
                    record.id,
                    record.values.len(),
                    self.dimension
                )));
            }
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        session_id: &str,
    ) -> Result<Vec<ScoredChunk>, AppError> {
        let guard = self.records.lock().await;
        let mut matches: Vec<ScoredChunk> = guard
            .values()
            .filter(|record| record.metadata.session_id == session_id)
            .map(|record| ScoredChunk {
                id: record.id.clone(),
                score: cosine_similarity(&vector, &record.values),
                metadata: record.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let mut guard = self.records.lock().await;
        guard.retain(|_, record| record.metadata.session_id != session_id);
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + 1e-10)
}

impl VectorRecord {
    /// Convenience constructor used by tests and the ingestion pipeline.
    pub fn new(id: impl Into<String>, values: Vec<f32>, text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values,
            metadata: ChunkMetadata {
                text: text.into(),
                session_id: session_id.into(),
            },
        }
    }
}
