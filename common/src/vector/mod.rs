use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub mod memory;
pub mod pinecone;

pub use memory::InMemoryVectorStore;
pub use pinecone::PineconeStore;

/// Metadata stored alongside every vector. The owning session id is what the
/// isolation invariant hangs on: queries and deletes are always filtered by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub text: String,
    pub session_id: String,
}

/// One chunk ready for upsert: stable id, embedding, metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A query match, ordered by descending cosine similarity.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Contract over any backing vector database.
///
/// Callers hand over the full record set; the adapter is responsible for
/// partitioning it into backend-sized batches. The session id is a typed
/// parameter rather than a free-form filter so an unfiltered (cross-session)
/// query or delete cannot be expressed at this seam.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the index with the configured dimension and cosine metric if
    /// it does not exist yet. Idempotent; called once before first use.
    async fn ensure_index(&self) -> Result<(), AppError>;

    /// Inserts or overwrites records by id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), AppError>;

    /// Returns at most `top_k` matches owned by `session_id`, best first.
    async fn query(
        &self,
        vector: Vec<f32>,
        top_k: usize,
        session_id: &str,
    ) -> Result<Vec<ScoredChunk>, AppError>;

    /// Removes every record owned by `session_id` and nothing else.
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
}

/// Backend batch-size limit for upserts.
pub const UPSERT_BATCH_SIZE: usize = 50;
