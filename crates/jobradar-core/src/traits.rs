use std::future::Future;

use crate::error::AppError;
use crate::models::{NewScrapeRun, NormalizedJob, ReconcileSummary};

/// Fetches the raw body of a URL.
///
/// Adapters are generic over this so extraction logic can be unit-tested
/// against canned pages without real HTTP.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// One external source of job postings.
///
/// Object-safe so the aggregator can hold a heterogeneous registry; each
/// implementation owns its transport details, pagination and extraction
/// rules, and returns already-normalized records. New sources are added by
/// writing one new adapter, never by touching the aggregator.
#[async_trait::async_trait]
pub trait JobSource: Send + Sync {
    /// Stable tag identifying this source (lowercase, e.g. `"lyra"`).
    fn name(&self) -> &'static str;

    /// The endpoint reported in [`crate::models::SourceError`]s.
    fn endpoint(&self) -> String;

    /// Extract all current postings from the source.
    ///
    /// A transport failure must surface as `Err`; a reachable source that
    /// yields nothing may return an empty list or a degraded dataset, but
    /// never an error.
    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError>;
}

/// Persists job records across aggregation runs.
pub trait JobStore: Send + Sync + Clone {
    /// Upsert the fresh records for one source and soft-delete everything
    /// of that source no longer present. Scoped strictly per source.
    fn reconcile(
        &self,
        source: &str,
        fresh: &[NormalizedJob],
    ) -> impl Future<Output = Result<ReconcileSummary, AppError>> + Send;

    /// Record one completed aggregation run for observability.
    fn record_run(&self, run: &NewScrapeRun) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A no-op JobStore for use when persistence is not needed.
#[derive(Debug, Clone)]
pub struct NullStore;

impl JobStore for NullStore {
    async fn reconcile(
        &self,
        _source: &str,
        _fresh: &[NormalizedJob],
    ) -> Result<ReconcileSummary, AppError> {
        Ok(ReconcileSummary::default())
    }

    async fn record_run(&self, _run: &NewScrapeRun) -> Result<(), AppError> {
        Ok(())
    }
}
