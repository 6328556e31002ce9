use std::{path::PathBuf, sync::Arc};

use tracing::{info, warn};

use common::{
    error::AppError,
    session::SessionStore,
    utils::{config::AppConfig, embedding::EmbeddingProvider},
    vector::{VectorRecord, VectorStore},
};

use crate::{
    chunking::chunk_text,
    extraction::{extract_text, DocumentFormat},
};

/// Source prefix for raw text ingested without a file.
const MANUAL_PREFIX: &str = "manual";

/// One uploaded file, already read into memory by the HTTP layer.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a successful batch: chunk count plus the session's file list
/// after recording the uploads.
#[derive(Debug)]
pub struct IngestReport {
    pub ingested_chunks: usize,
    pub files: Vec<String>,
}

/// Orchestrates an upload batch: validate, persist temp files, extract,
/// chunk, embed, record filenames, upsert.
///
/// The batch is atomic towards the session store: formats and quota are
/// checked before any side effect, and a failed upsert rolls the recorded
/// filenames back so the file list never disagrees with stored vectors.
pub struct IngestionPipeline {
    sessions: Arc<SessionStore>,
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<EmbeddingProvider>,
    upload_dir: PathBuf,
    chunk_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        sessions: Arc<SessionStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<EmbeddingProvider>,
        config: &AppConfig,
    ) -> Self {
        Self {
            sessions,
            vectors,
            embedder,
            upload_dir: PathBuf::from(&config.upload_dir),
            chunk_size: config.chunk_size,
        }
    }

    pub async fn ingest_batch(
        &self,
        files: Vec<UploadedFile>,
        content: Option<String>,
        session_id: &str,
    ) -> Result<IngestReport, AppError> {
        // Fail fast, before any side effect: every format must be supported
        // and the whole batch must fit the per-session quota.
        let formats = files
            .iter()
            .map(|file| DocumentFormat::from_filename(&file.filename))
            .collect::<Result<Vec<_>, _>>()?;
        self.sessions.check_quota(session_id, files.len()).await?;

        let mut filenames = Vec::with_capacity(files.len());
        let mut temp_paths = Vec::with_capacity(files.len());
        let mut sources: Vec<(String, Vec<String>)> = Vec::new();

        for (file, format) in files.into_iter().zip(formats) {
            let sanitized = sanitize_file_name(&file.filename);
            match self.persist_upload(session_id, &sanitized, &file.bytes).await {
                Ok(temp_path) => temp_paths.push(temp_path),
                Err(err) => {
                    self.discard_temp_files(&temp_paths).await;
                    return Err(err);
                }
            }

            let text = match extract_text(format, file.bytes).await {
                Ok(text) => text,
                Err(err) => {
                    self.discard_temp_files(&temp_paths).await;
                    return Err(err);
                }
            };

            sources.push((sanitized, chunk_text(&text, self.chunk_size)));
            filenames.push(file.filename);
        }

        if let Some(content) = content.filter(|c| !c.trim().is_empty()) {
            sources.push((MANUAL_PREFIX.to_owned(), chunk_text(&content, self.chunk_size)));
        }

        let records = match self.embed_sources(session_id, sources).await {
            Ok(records) => records,
            Err(err) => {
                self.discard_temp_files(&temp_paths).await;
                return Err(err);
            }
        };
        let ingested_chunks = records.len();

        // Record filenames first, then upsert in one call; rolling back a
        // recorded batch is cheaper than deleting freshly stored vectors.
        if let Err(err) = self.sessions.record_uploads(session_id, &filenames).await {
            self.discard_temp_files(&temp_paths).await;
            return Err(err);
        }

        if let Err(err) = self.vectors.upsert(records).await {
            self.sessions.remove_uploads(session_id, &filenames).await;
            self.discard_temp_files(&temp_paths).await;
            return Err(err);
        }

        info!(
            %session_id,
            files = filenames.len(),
            chunks = ingested_chunks,
            "Ingested upload batch"
        );

        Ok(IngestReport {
            ingested_chunks,
            files: self.sessions.list_files(session_id).await,
        })
    }

    /// Embeds every chunk of every source and builds the records keyed
    /// `{session_id}-{source}-{index}`.
    async fn embed_sources(
        &self,
        session_id: &str,
        sources: Vec<(String, Vec<String>)>,
    ) -> Result<Vec<VectorRecord>, AppError> {
        let texts: Vec<String> = sources
            .iter()
            .flat_map(|(_, chunks)| chunks.iter().cloned())
            .collect();
        let mut embeddings = self.embedder.embed_batch(texts).await?.into_iter();

        let mut records = Vec::new();
        for (source, chunks) in sources {
            for (index, chunk) in chunks.into_iter().enumerate() {
                let values = embeddings.next().ok_or_else(|| {
                    AppError::Processing("embedding batch returned too few vectors".into())
                })?;
                records.push(VectorRecord::new(
                    format!("{session_id}-{source}-{index}"),
                    values,
                    chunk,
                    session_id,
                ));
            }
        }

        Ok(records)
    }

    /// Writes the raw bytes to `{upload_dir}/{session_id}-{filename}` so the
    /// sweeper can later find them by the session id prefix.
    async fn persist_upload(
        &self,
        session_id: &str,
        sanitized_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(format!("{session_id}-{sanitized_name}"));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    async fn discard_temp_files(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(err) = tokio::fs::remove_file(path).await {
                warn!(?path, error = %err, "Failed to remove temp file after aborted batch");
            }
        }
    }
}

/// Replaces anything that could smuggle a path component into the temp file
/// name. Keeps the extension separator so format detection stays readable on
/// disk.
fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::vector::InMemoryVectorStore;
    use tempfile::TempDir;

    struct Fixture {
        sessions: Arc<SessionStore>,
        vectors: Arc<InMemoryVectorStore>,
        pipeline: IngestionPipeline,
        _upload_dir: TempDir,
    }

    fn fixture(max_files: usize) -> Fixture {
        let upload_dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            upload_dir: upload_dir.path().to_string_lossy().into_owned(),
            max_files_per_session: max_files,
            ..AppConfig::default()
        };
        let sessions = Arc::new(SessionStore::new(config.max_files_per_session));
        let vectors = Arc::new(InMemoryVectorStore::new(384));
        let embedder = Arc::new(EmbeddingProvider::new_hashed(384).expect("embedder"));
        let pipeline = IngestionPipeline::new(
            Arc::clone(&sessions),
            Arc::clone(&vectors) as Arc<dyn VectorStore>,
            embedder,
            &config,
        );
        Fixture {
            sessions,
            vectors,
            pipeline,
            _upload_dir: upload_dir,
        }
    }

    fn txt_file(name: &str, body: &str) -> UploadedFile {
        UploadedFile {
            filename: name.to_owned(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn text_upload_produces_expected_chunks() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        let report = fx
            .pipeline
            .ingest_batch(
                vec![txt_file("essay.txt", &"x".repeat(2500))],
                None,
                &session_id,
            )
            .await
            .expect("ingest");

        assert_eq!(report.ingested_chunks, 3);
        assert_eq!(report.files, vec!["essay.txt".to_string()]);
        assert_eq!(fx.vectors.len().await, 3);
    }

    #[tokio::test]
    async fn unsupported_format_rejects_before_any_side_effect() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        let result = fx
            .pipeline
            .ingest_batch(
                vec![txt_file("fine.txt", "body"), txt_file("nope.exe", "body")],
                None,
                &session_id,
            )
            .await;

        assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
        assert!(fx.sessions.list_files(&session_id).await.is_empty());
        assert!(fx.vectors.is_empty().await);
    }

    #[tokio::test]
    async fn quota_overflow_rejects_the_whole_batch() {
        let fx = fixture(2);
        let session_id = fx.sessions.create_session().await;
        fx.pipeline
            .ingest_batch(vec![txt_file("first.txt", "body")], None, &session_id)
            .await
            .expect("first upload");
        let files_before = fx.sessions.list_files(&session_id).await;
        let vectors_before = fx.vectors.len().await;

        let result = fx
            .pipeline
            .ingest_batch(
                vec![txt_file("second.txt", "body"), txt_file("third.txt", "body")],
                None,
                &session_id,
            )
            .await;

        assert!(matches!(result, Err(AppError::QuotaExceeded { remaining: 1 })));
        assert_eq!(fx.sessions.list_files(&session_id).await, files_before);
        assert_eq!(fx.vectors.len().await, vectors_before);
    }

    #[tokio::test]
    async fn empty_file_yields_zero_chunks_but_records_the_name() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        let report = fx
            .pipeline
            .ingest_batch(vec![txt_file("empty.txt", "")], None, &session_id)
            .await
            .expect("ingest");

        assert_eq!(report.ingested_chunks, 0);
        assert_eq!(report.files, vec!["empty.txt".to_string()]);
        assert!(fx.vectors.is_empty().await);
    }

    #[tokio::test]
    async fn manual_content_is_ingested_under_the_manual_prefix() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        let report = fx
            .pipeline
            .ingest_batch(Vec::new(), Some("pasted note".to_owned()), &session_id)
            .await
            .expect("ingest");

        assert_eq!(report.ingested_chunks, 1);
        // Manual text does not count against the file quota.
        assert!(report.files.is_empty());

        let embedder = EmbeddingProvider::new_hashed(384).expect("embedder");
        let query = embedder.embed("pasted note").await.expect("embed");
        let matches = fx.vectors.query(query, 5, &session_id).await.expect("query");
        assert_eq!(matches.first().map(|m| m.id.as_str()), Some(format!("{session_id}-manual-0").as_str()));
    }

    #[tokio::test]
    async fn temp_file_is_keyed_by_session_id_prefix() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        fx.pipeline
            .ingest_batch(vec![txt_file("my report.txt", "body")], None, &session_id)
            .await
            .expect("ingest");

        let expected = fx
            ._upload_dir
            .path()
            .join(format!("{session_id}-my_report.txt"));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn reupload_overwrites_instead_of_duplicating_vectors() {
        let fx = fixture(5);
        let session_id = fx.sessions.create_session().await;

        fx.pipeline
            .ingest_batch(vec![txt_file("doc.txt", "original body")], None, &session_id)
            .await
            .expect("first ingest");
        fx.pipeline
            .ingest_batch(vec![txt_file("doc.txt", "revised body")], None, &session_id)
            .await
            .expect("second ingest");

        // Same chunk ids, so the vector count stays flat.
        assert_eq!(fx.vectors.len().await, 1);
    }

    #[test]
    fn sanitize_file_name_strips_path_components() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("my report.txt"), "my_report.txt");
        assert_eq!(sanitize_file_name("clean_name.pdf"), "clean_name.pdf");
    }
}
