use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    FastEmbed,
    Hashed,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::FastEmbed
}

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Pinecone,
    Memory,
}

fn default_vector_backend() -> VectorBackend {
    VectorBackend::Pinecone
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,
    #[serde(default = "default_vector_backend")]
    pub vector_backend: VectorBackend,
    #[serde(default)]
    pub pinecone_api_key: String,
    #[serde(default = "default_index_name")]
    pub pinecone_index: String,
    #[serde(default = "default_pinecone_cloud")]
    pub pinecone_cloud: String,
    #[serde(default = "default_pinecone_region")]
    pub pinecone_region: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_max_files_per_session")]
    pub max_files_per_session: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_upload_max_body_bytes")]
    pub upload_max_body_bytes: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_index_name() -> String {
    "doc-chat".to_string()
}

fn default_pinecone_cloud() -> String {
    "aws".to_string()
}

fn default_pinecone_region() -> String {
    "us-east-1".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_max_files_per_session() -> usize {
    5
}

fn default_chunk_size() -> usize {
    1000
}

fn default_retrieval_top_k() -> usize {
    5
}

fn default_upload_dir() -> String {
    "./temp_uploads".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_upload_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_backend: default_embedding_backend(),
            embedding_model: default_embedding_model(),
            embedding_dimension: default_embedding_dimension(),
            vector_backend: default_vector_backend(),
            pinecone_api_key: String::new(),
            pinecone_index: default_index_name(),
            pinecone_cloud: default_pinecone_cloud(),
            pinecone_region: default_pinecone_region(),
            session_ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_files_per_session: default_max_files_per_session(),
            chunk_size: default_chunk_size(),
            retrieval_top_k: default_retrieval_top_k(),
            upload_dir: default_upload_dir(),
            http_port: default_http_port(),
            upload_max_body_bytes: default_upload_max_body_bytes(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();

        assert_eq!(config.embedding_dimension, 384);
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.max_files_per_session, 5);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.retrieval_top_k, 5);
        assert_eq!(config.embedding_backend, EmbeddingBackend::FastEmbed);
    }
}
