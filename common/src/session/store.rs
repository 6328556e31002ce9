use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;

/// Per-session bookkeeping: activity timestamp plus the ordered list of
/// uploaded filenames. Vectors and temp files live elsewhere, keyed by the
/// session id.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub last_activity: DateTime<Utc>,
    pub files: Vec<String>,
}

impl SessionEntry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: now,
            files: Vec::new(),
        }
    }
}

/// Concurrency-safe map of session id to session metadata. Shared between
/// request handlers and the expiry sweeper as `Arc<SessionStore>`; every
/// read-modify-write happens under the one lock, so `clear` acts as a hard
/// barrier against stale in-flight updates.
///
/// Unknown session ids are auto-vivified on activity (lenient policy, applied
/// uniformly across touch, upload and ask paths).
pub struct SessionStore {
    max_files: usize,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(max_files: usize) -> Self {
        Self {
            max_files,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Generates a fresh session id and initialises its activity record.
    pub async fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut guard = self.sessions.lock().await;
        guard.insert(session_id.clone(), SessionEntry::new(Utc::now()));
        session_id
    }

    /// Refreshes the last-activity timestamp, creating the entry if needed.
    pub async fn touch(&self, session_id: &str) {
        self.touch_at(session_id, Utc::now()).await;
    }

    /// `touch` with an explicit timestamp, for deterministic TTL tests.
    pub async fn touch_at(&self, session_id: &str, now: DateTime<Utc>) {
        let mut guard = self.sessions.lock().await;
        guard
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionEntry::new(now))
            .last_activity = now;
    }

    /// Checks whether `additional` more uploads would fit under the
    /// per-session limit without recording anything. Lets callers reject a
    /// whole batch before any processing starts.
    pub async fn check_quota(&self, session_id: &str, additional: usize) -> Result<(), AppError> {
        let guard = self.sessions.lock().await;
        let current = guard.get(session_id).map_or(0, |entry| entry.files.len());
        quota_check(current, additional, self.max_files)
    }

    /// Appends a batch of filenames atomically. Either every filename is
    /// recorded or none is; on `QuotaExceeded` the list is unchanged.
    pub async fn record_uploads(
        &self,
        session_id: &str,
        filenames: &[String],
    ) -> Result<(), AppError> {
        let mut guard = self.sessions.lock().await;
        let entry = guard
            .entry(session_id.to_owned())
            .or_insert_with(|| SessionEntry::new(Utc::now()));
        quota_check(entry.files.len(), filenames.len(), self.max_files)?;
        entry.files.extend_from_slice(filenames);
        entry.last_activity = Utc::now();
        Ok(())
    }

    /// Rollback for a failed batch: removes one occurrence of each filename.
    pub async fn remove_uploads(&self, session_id: &str, filenames: &[String]) {
        let mut guard = self.sessions.lock().await;
        if let Some(entry) = guard.get_mut(session_id) {
            for name in filenames {
                if let Some(pos) = entry.files.iter().position(|f| f == name) {
                    entry.files.remove(pos);
                }
            }
        }
    }

    /// Returns the recorded filenames; empty for unknown sessions.
    pub async fn list_files(&self, session_id: &str) -> Vec<String> {
        let guard = self.sessions.lock().await;
        guard
            .get(session_id)
            .map(|entry| entry.files.clone())
            .unwrap_or_default()
    }

    /// Removes the session entry. Idempotent; clearing an unknown id is fine.
    pub async fn clear(&self, session_id: &str) {
        let mut guard = self.sessions.lock().await;
        guard.remove(session_id);
    }

    /// Pure query: every session whose last activity is older than
    /// `now - ttl`.
    pub async fn expired_sessions(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<String> {
        let guard = self.sessions.lock().await;
        guard
            .iter()
            .filter(|(_, entry)| now - entry.last_activity > ttl)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn quota_check(current: usize, additional: usize, max_files: usize) -> Result<(), AppError> {
    let remaining = max_files.saturating_sub(current);
    if additional > remaining {
        return Err(AppError::QuotaExceeded { remaining });
    }
    Ok(())
}
