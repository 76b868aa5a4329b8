//! Concurrent multi-source aggregation.
//!
//! Runs every registered [`JobSource`] as its own tokio task, waits for
//! all of them to reach a terminal state (never fail-fast), merges the
//! successful outputs and deduplicates by job id. Failures are contained
//! per source: each failed adapter contributes exactly one
//! [`SourceError`] and costs nothing to the others.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{AggregationResult, NormalizedJob, SourceError};
use crate::traits::JobSource;

pub struct Aggregator {
    sources: Vec<Arc<dyn JobSource>>,
    timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn JobSource>>) -> Self {
        Self {
            sources,
            timeout: None,
        }
    }

    /// Apply a deadline to the whole run. Adapters that have not finished
    /// when it fires are abandoned and recorded as timed out; results from
    /// adapters that already completed are kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Tags of all registered sources, in registration order.
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run all registered adapters concurrently and merge their outputs.
    ///
    /// Always returns a well-formed result: total failure is an empty job
    /// list plus one error per source, not an `Err`.
    pub async fn run(&self) -> AggregationResult {
        let handles: Vec<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                tokio::spawn(async move { source.fetch_jobs().await })
            })
            .collect();

        let deadline = self.timeout.map(|t| tokio::time::Instant::now() + t);

        let mut merged: Vec<NormalizedJob> = Vec::new();
        let mut errors: Vec<SourceError> = Vec::new();

        // Tasks run concurrently; awaiting the handles in registration
        // order only affects collection, and makes first-occurrence-wins
        // deduplication deterministic.
        for (source, handle) in self.sources.iter().zip(handles) {
            let abort = handle.abort_handle();
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        abort.abort();
                        tracing::warn!(source = source.name(), "Adapter abandoned at deadline");
                        errors.push(SourceError {
                            source: source.name().to_string(),
                            message: format!(
                                "aggregation timed out after {}s",
                                self.timeout.unwrap_or_default().as_secs()
                            ),
                            endpoint: source.endpoint(),
                        });
                        continue;
                    }
                },
                None => handle.await,
            };

            match joined {
                Ok(Ok(jobs)) => {
                    tracing::info!(source = source.name(), count = jobs.len(), "Source ok");
                    merged.extend(jobs);
                }
                Ok(Err(e)) => {
                    tracing::warn!(source = source.name(), error = %e, "Source failed");
                    errors.push(SourceError {
                        source: source.name().to_string(),
                        message: e.to_string(),
                        endpoint: source.endpoint(),
                    });
                }
                Err(join_err) => {
                    tracing::error!(source = source.name(), error = %join_err, "Adapter task died");
                    errors.push(SourceError {
                        source: source.name().to_string(),
                        message: format!("adapter task died: {join_err}"),
                        endpoint: source.endpoint(),
                    });
                }
            }
        }

        let jobs = dedup_by_id(merged);
        tracing::info!(
            jobs = jobs.len(),
            failed_sources = errors.len(),
            "Aggregation complete"
        );

        AggregationResult { jobs, errors }
    }
}

/// Drop records whose id was already seen. First occurrence wins; later
/// duplicates are definitionally the same posting and vanish silently.
pub fn dedup_by_id(jobs: Vec<NormalizedJob>) -> Vec<NormalizedJob> {
    let mut seen = HashSet::with_capacity(jobs.len());
    jobs.into_iter()
        .filter(|job| {
            if seen.insert(job.id.clone()) {
                true
            } else {
                tracing::debug!(id = %job.id, "Duplicate posting dropped");
                false
            }
        })
        .collect()
}
