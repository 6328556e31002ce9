use std::{path::PathBuf, sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{error::AppError, vector::VectorStore};

use super::SessionStore;

/// Background task that purges sessions inactive for longer than the TTL.
///
/// Runs until the cancellation token fires; each sweep handles sessions
/// independently so one failing cleanup never blocks the rest.
pub struct ExpirySweeper {
    sessions: Arc<SessionStore>,
    vectors: Arc<dyn VectorStore>,
    upload_dir: PathBuf,
    ttl: Duration,
    interval: StdDuration,
}

impl ExpirySweeper {
    pub fn new(
        sessions: Arc<SessionStore>,
        vectors: Arc<dyn VectorStore>,
        upload_dir: impl Into<PathBuf>,
        ttl_secs: u64,
        interval_secs: u64,
    ) -> Self {
        Self {
            sessions,
            vectors,
            upload_dir: upload_dir.into(),
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
            interval: StdDuration::from_secs(interval_secs),
        }
    }

    /// Sweep loop; exits only when `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so a fresh process does
        // not sweep before handling any request.
        ticker.tick().await;

        info!(
            ttl_secs = self.ttl.num_seconds(),
            interval_secs = self.interval.as_secs(),
            "Expiry sweeper started"
        );

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Expiry sweeper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.sweep_once(Utc::now()).await;
                }
            }
        }
    }

    /// One pass over the session store. Returns the number of sessions fully
    /// purged; exposed separately so tests can drive it with a fake clock.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> usize {
        let expired = self.sessions.expired_sessions(now, self.ttl).await;
        let mut purged = 0;

        for session_id in expired {
            match purge_session(
                &self.sessions,
                self.vectors.as_ref(),
                &self.upload_dir,
                &session_id,
            )
            .await
            {
                Ok(()) => {
                    info!(%session_id, "Auto-cleared expired session");
                    purged += 1;
                }
                Err(err) => {
                    // Entry stays put so the next sweep retries; a dangling
                    // store entry is preferred over dangling vectors or files.
                    error!(%session_id, error = %err, "Failed to clear expired session");
                }
            }
        }

        purged
    }
}

/// Removes everything a session owns: vectors first, then temp files, then
/// the session entry. The ordering is deliberate — external resources are
/// released before the entry that points at them disappears.
///
/// Shared between the sweeper and the explicit clear endpoint.
pub async fn purge_session(
    sessions: &SessionStore,
    vectors: &dyn VectorStore,
    upload_dir: &std::path::Path,
    session_id: &str,
) -> Result<(), AppError> {
    vectors.delete_session(session_id).await?;
    remove_temp_files(upload_dir, session_id).await?;
    sessions.clear(session_id).await;
    Ok(())
}

/// Deletes temp files named `{session_id}-*` under the upload directory.
/// A missing directory means nothing was ever uploaded.
async fn remove_temp_files(
    upload_dir: &std::path::Path,
    session_id: &str,
) -> Result<(), AppError> {
    let mut entries = match tokio::fs::read_dir(upload_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let prefix = format!("{session_id}-");
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with(&prefix) {
            if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                warn!(path = ?entry.path(), error = %err, "Failed to delete temp file");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{InMemoryVectorStore, VectorRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sweeper_with(
        sessions: Arc<SessionStore>,
        vectors: Arc<dyn VectorStore>,
        upload_dir: &std::path::Path,
    ) -> ExpirySweeper {
        ExpirySweeper::new(sessions, vectors, upload_dir, 3600, 60)
    }

    #[tokio::test]
    async fn sweep_purges_expired_sessions_and_their_resources() {
        let sessions = Arc::new(SessionStore::new(5));
        let vectors = Arc::new(InMemoryVectorStore::new(3));
        let dir = tempfile::tempdir().expect("tempdir");

        let now = Utc::now();
        sessions.touch_at("stale", now - Duration::seconds(7200)).await;
        sessions
            .record_uploads("stale", &["doc.txt".to_string()])
            .await
            .expect("record");
        vectors
            .upsert(vec![VectorRecord::new(
                "stale-doc.txt-0",
                vec![1.0, 0.0, 0.0],
                "chunk",
                "stale",
            )])
            .await
            .expect("upsert");
        tokio::fs::write(dir.path().join("stale-doc.txt"), b"raw bytes")
            .await
            .expect("write temp");

        let sweeper = sweeper_with(Arc::clone(&sessions), Arc::clone(&vectors) as _, dir.path());
        let purged = sweeper.sweep_once(now).await;

        assert_eq!(purged, 1);
        assert!(vectors.is_empty().await);
        assert!(sessions.list_files("stale").await.is_empty());
        assert!(!dir.path().join("stale-doc.txt").exists());
    }

    #[tokio::test]
    async fn sweep_leaves_active_sessions_alone() {
        let sessions = Arc::new(SessionStore::new(5));
        let vectors = Arc::new(InMemoryVectorStore::new(3));
        let dir = tempfile::tempdir().expect("tempdir");

        let now = Utc::now();
        sessions.touch_at("stale", now - Duration::seconds(7200)).await;
        sessions.touch_at("fresh", now).await;

        let sweeper = sweeper_with(Arc::clone(&sessions), vectors as _, dir.path());
        let purged = sweeper.sweep_once(now).await;

        assert_eq!(purged, 1);
        assert_eq!(sessions.session_count().await, 1);
    }

    #[tokio::test]
    async fn failing_cleanup_keeps_the_session_for_the_next_sweep() {
        struct FailingStore {
            calls: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl VectorStore for FailingStore {
            async fn ensure_index(&self) -> Result<(), AppError> {
                Ok(())
            }
            async fn upsert(&self, _records: Vec<VectorRecord>) -> Result<(), AppError> {
                Ok(())
            }
            async fn query(
                &self,
                _vector: Vec<f32>,
                _top_k: usize,
                _session_id: &str,
            ) -> Result<Vec<crate::vector::ScoredChunk>, AppError> {
                Ok(Vec::new())
            }
            async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if session_id == "broken" {
                    return Err(AppError::VectorStore("backend unavailable".into()));
                }
                Ok(())
            }
        }

        let sessions = Arc::new(SessionStore::new(5));
        let vectors = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let dir = tempfile::tempdir().expect("tempdir");

        let now = Utc::now();
        sessions.touch_at("broken", now - Duration::seconds(7200)).await;
        sessions.touch_at("healthy", now - Duration::seconds(7200)).await;

        let sweeper = sweeper_with(Arc::clone(&sessions), Arc::clone(&vectors) as _, dir.path());
        let purged = sweeper.sweep_once(now).await;

        // The broken session did not abort the sweep.
        assert_eq!(purged, 1);
        assert_eq!(vectors.calls.load(Ordering::SeqCst), 2);
        assert_eq!(sessions.session_count().await, 1);
        assert!(sessions
            .expired_sessions(now, Duration::seconds(3600))
            .await
            .contains(&"broken".to_string()));
    }

    #[tokio::test]
    async fn run_exits_on_cancellation() {
        let sessions = Arc::new(SessionStore::new(5));
        let vectors: Arc<dyn VectorStore> = Arc::new(InMemoryVectorStore::new(3));
        let dir = tempfile::tempdir().expect("tempdir");

        let sweeper = ExpirySweeper::new(sessions, vectors, dir.path(), 3600, 3600);
        let token = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(token.clone()));

        token.cancel();
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("sweeper should exit promptly")
            .expect("sweeper task should not panic");
    }

    #[tokio::test]
    async fn purge_ignores_missing_upload_dir() {
        let sessions = SessionStore::new(5);
        let vectors = InMemoryVectorStore::new(3);
        sessions.touch("ephemeral").await;

        purge_session(
            &sessions,
            &vectors,
            std::path::Path::new("./does-not-exist"),
            "ephemeral",
        )
        .await
        .expect("missing dir is not an error");

        assert_eq!(sessions.session_count().await, 0);
    }
}
