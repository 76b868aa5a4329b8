//! Refresh orchestration: cache check → aggregation → cache write →
//! store reconciliation.
//!
//! Single entry point used by the server and the CLI. Generic over the
//! store via [`JobStore`], enabling dependency injection and testability
//! without a real database.

use chrono::Utc;
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::cache::{CacheStatus, JobCache};
use crate::models::{NewScrapeRun, NormalizedJob, ReconcileSummary, SourceError};
use crate::traits::JobStore;

/// What a refresh request produced, ready for the presentation layer.
/// Always well-formed: total failure is an empty job list plus errors,
/// never an `Err`.
#[derive(Debug, Clone)]
pub struct ServedResult {
    pub jobs: Vec<NormalizedJob>,
    pub errors: Vec<SourceError>,
    /// When the served data was produced, epoch milliseconds.
    pub created_at: i64,
    /// True when served from cache (fresh-window hit or stale fallback).
    pub from_cache: bool,
}

/// Orchestrates the full refresh pipeline.
pub struct RefreshService<S: JobStore> {
    aggregator: Aggregator,
    cache: JobCache,
    store: Option<S>,
}

impl<S: JobStore> RefreshService<S> {
    /// Pipeline without persistence (cache only).
    pub fn new(aggregator: Aggregator, cache: JobCache) -> Self {
        Self {
            aggregator,
            cache,
            store: None,
        }
    }

    /// Pipeline that also reconciles the persistent store after each
    /// fresh run.
    pub fn with_store(aggregator: Aggregator, cache: JobCache, store: S) -> Self {
        Self {
            aggregator,
            cache,
            store: Some(store),
        }
    }

    /// Serve the aggregated dataset.
    ///
    /// Unless `force` is set, a cache entry inside its validity window is
    /// returned as-is. Otherwise every source adapter runs concurrently;
    /// the merged result replaces the cache entry and, when a store is
    /// attached, is reconciled per source. If every adapter fails, the
    /// last good cache entry — even expired — is preferred over nothing.
    pub async fn fetch(&self, force: bool) -> ServedResult {
        if !force {
            if let Some(entry) = self.cache.get().await {
                tracing::info!(jobs = entry.jobs.len(), "Serving cached result");
                return ServedResult {
                    jobs: entry.jobs,
                    errors: entry.errors,
                    created_at: entry.created_at,
                    from_cache: true,
                };
            }
        }

        let started_at = Utc::now();
        tracing::info!(force, "Starting fresh aggregation run");
        let result = self.aggregator.run().await;

        if result.is_total_failure() {
            if let Some(stale) = self.cache.get_stale().await {
                tracing::warn!(
                    failed_sources = result.errors.len(),
                    "All sources failed, serving last good cache entry"
                );
                return ServedResult {
                    jobs: stale.jobs,
                    errors: result.errors,
                    created_at: stale.created_at,
                    from_cache: true,
                };
            }
            tracing::error!("All sources failed and no cache entry exists");
            return ServedResult {
                jobs: Vec::new(),
                errors: result.errors,
                created_at: started_at.timestamp_millis(),
                from_cache: false,
            };
        }

        // Cache write failure degrades to an uncached fresh result.
        if let Err(e) = self.cache.put(&result).await {
            tracing::warn!(error = %e, "Failed to persist cache entry");
        }

        if let Some(store) = &self.store {
            self.reconcile_all(store, &result).await;

            let run = NewScrapeRun {
                id: Uuid::new_v4(),
                started_at,
                finished_at: Utc::now(),
                total_jobs: result.jobs.len(),
                errors: result.errors.clone(),
            };
            if let Err(e) = store.record_run(&run).await {
                tracing::warn!(error = %e, "Failed to record scrape run");
            }
        }

        ServedResult {
            jobs: result.jobs,
            errors: result.errors,
            created_at: started_at.timestamp_millis(),
            from_cache: false,
        }
    }

    /// Reconcile each source that completed this run.
    ///
    /// A failed source is skipped entirely — deactivating its records on
    /// the back of a transport failure would retire postings that are
    /// still live. A source that only produced degraded fallback data is
    /// skipped too: the fallback is not a reliable absence signal.
    async fn reconcile_all(&self, store: &S, result: &crate::models::AggregationResult) {
        for source in self.aggregator.source_names() {
            if result.source_failed(source) {
                tracing::debug!(source, "Skipping reconcile for failed source");
                continue;
            }
            let fresh = result.jobs_for_source(source);
            if fresh.iter().any(|j| j.degraded) {
                tracing::info!(source, "Skipping reconcile for degraded dataset");
                continue;
            }
            match store.reconcile(source, &fresh).await {
                Ok(ReconcileSummary {
                    created,
                    updated,
                    deactivated,
                }) => {
                    tracing::info!(source, created, updated, deactivated, "Reconciled source");
                }
                Err(e) => {
                    tracing::warn!(source, error = %e, "Reconcile failed");
                }
            }
        }
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.status().await
    }

    pub async fn invalidate_cache(&self) -> Result<(), crate::error::AppError> {
        self.cache.invalidate().await
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.aggregator.source_names()
    }
}
