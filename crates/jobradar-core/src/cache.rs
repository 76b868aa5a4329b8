//! Persistent single-entry result cache.
//!
//! The last successful aggregation run is kept as one JSON blob on disk
//! (survives restarts) and served for the length of the validity window.
//! `put` replaces the whole entry atomically — a temp file is written and
//! renamed into place, so a concurrent reader sees either the old entry or
//! the new one, never a half-written blob. A corrupt entry degrades to a
//! cache miss, never to an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{AggregationResult, NormalizedJob, SourceError};

/// Default validity window: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Well-known cache file name (single-tenant — one active entry).
pub const CACHE_FILE_NAME: &str = "jobs-cache.json";

/// The persisted cache blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub jobs: Vec<NormalizedJob>,
    pub errors: Vec<SourceError>,
    /// Write time, epoch milliseconds.
    pub created_at: i64,
}

impl CacheEntry {
    pub fn age(&self) -> Duration {
        let millis = (Utc::now().timestamp_millis() - self.created_at).max(0);
        Duration::from_millis(millis as u64)
    }
}

/// Cache state as reported to callers and the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
}

impl CacheStatus {
    fn empty() -> Self {
        Self {
            cached: false,
            age_seconds: None,
            job_count: None,
            remaining_seconds: None,
        }
    }
}

/// File-backed cache for the last successful [`AggregationResult`].
#[derive(Clone)]
pub struct JobCache {
    path: PathBuf,
    ttl: Duration,
    /// Serializes writers; readers go through the rename-visible file only.
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl JobCache {
    /// Cache at the given file path with the default 24h window.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Cache in `dir` under the well-known entry name.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CACHE_FILE_NAME))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached entry, if present and still inside the validity window.
    pub async fn get(&self) -> Option<CacheEntry> {
        let entry = self.read_entry().await?;
        let age = entry.age();
        if age >= self.ttl {
            tracing::debug!(age_secs = age.as_secs(), "Cache entry expired");
            return None;
        }
        Some(entry)
    }

    /// The cached entry regardless of age. Only for the degraded path
    /// where a fresh run failed completely and stale data beats none.
    pub async fn get_stale(&self) -> Option<CacheEntry> {
        self.read_entry().await
    }

    /// Replace the entry wholesale with this run's result.
    pub async fn put(&self, result: &AggregationResult) -> Result<(), AppError> {
        let entry = CacheEntry {
            jobs: result.jobs.clone(),
            errors: result.errors.clone(),
            created_at: Utc::now().timestamp_millis(),
        };
        let payload = serde_json::to_vec_pretty(&entry)?;

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::CacheError(format!("create cache dir: {e}")))?;
        }

        // Write-then-rename keeps the swap atomic for readers.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &payload)
            .await
            .map_err(|e| AppError::CacheError(format!("write cache entry: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::CacheError(format!("publish cache entry: {e}")))?;

        tracing::info!(jobs = entry.jobs.len(), path = %self.path.display(), "Cache updated");
        Ok(())
    }

    /// Force the next `get()` to miss, independent of age.
    pub async fn invalidate(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Cache invalidated");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::CacheError(format!("invalidate cache: {e}"))),
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let Some(entry) = self.get().await else {
            return CacheStatus::empty();
        };
        let age = entry.age();
        CacheStatus {
            cached: true,
            age_seconds: Some(age.as_secs()),
            job_count: Some(entry.jobs.len()),
            remaining_seconds: Some(self.ttl.saturating_sub(age).as_secs()),
        }
    }

    async fn read_entry(&self) -> Option<CacheEntry> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Cache entry corrupt, treating as miss");
                None
            }
        }
    }
}
