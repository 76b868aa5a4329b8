//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::identity::compute_id;
use crate::models::{NewScrapeRun, NormalizedJob, ReconcileSummary};
use crate::traits::{Fetcher, JobSource, JobStore};

/// Rebuild an error of the same variant (AppError is not Clone).
fn clone_error(e: &AppError) -> AppError {
    match e {
        AppError::HttpError(m) => AppError::HttpError(m.clone()),
        AppError::NetworkError(m) => AppError::NetworkError(m.clone()),
        AppError::Timeout(s) => AppError::Timeout(*s),
        AppError::ParseError(m) => AppError::ParseError(m.clone()),
        AppError::CacheError(m) => AppError::CacheError(m.clone()),
        AppError::DatabaseError(m) => AppError::DatabaseError(m.clone()),
        AppError::ConfigError(m) => AppError::ConfigError(m.clone()),
        other => AppError::Generic(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that serves a queue of canned responses, one per call.
///
/// An exhausted queue is an error: pagination tests must queue exactly the
/// pages they expect the adapter to request.
#[derive(Clone)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requested_urls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested_urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue of page bodies, served in order.
    pub fn with_pages(pages: Vec<&str>) -> Self {
        Self::with_responses(pages.into_iter().map(|p| Ok(p.to_string())).collect())
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested_urls.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(AppError::HttpError("mock fetcher exhausted".into()))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock job source with a configurable outcome, optional artificial
/// latency, and a call counter.
pub struct MockSource {
    name: &'static str,
    jobs: Vec<NormalizedJob>,
    error: Option<AppError>,
    delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            jobs: Vec::new(),
            error: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_jobs(mut self, jobs: Vec<NormalizedJob>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_error(mut self, error: AppError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobSource for MockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn endpoint(&self) -> String {
        format!("https://{}.example.com/jobs", self.name)
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.error {
            Some(e) => Err(clone_error(e)),
            None => Ok(self.jobs.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockJobStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MockRecord {
    source: String,
    active: bool,
}

/// In-memory JobStore that applies real reconcile semantics, so tests can
/// assert on both summaries and resulting active/inactive state.
#[derive(Clone, Default)]
pub struct MockJobStore {
    records: Arc<Mutex<HashMap<String, MockRecord>>>,
    pub reconciled_sources: Arc<Mutex<Vec<String>>>,
    pub runs: Arc<Mutex<Vec<NewScrapeRun>>>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored record directly.
    pub fn seed(&self, id: &str, source: &str, active: bool) {
        self.records.lock().unwrap().insert(
            id.to_string(),
            MockRecord {
                source: source.to_string(),
                active,
            },
        );
    }

    pub fn is_active(&self, id: &str) -> Option<bool> {
        self.records.lock().unwrap().get(id).map(|r| r.active)
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

impl JobStore for MockJobStore {
    async fn reconcile(
        &self,
        source: &str,
        fresh: &[NormalizedJob],
    ) -> Result<ReconcileSummary, AppError> {
        self.reconciled_sources
            .lock()
            .unwrap()
            .push(source.to_string());

        let mut records = self.records.lock().unwrap();
        let mut summary = ReconcileSummary::default();
        let fresh_ids: Vec<&str> = fresh.iter().map(|j| j.id.as_str()).collect();

        for job in fresh {
            if records.contains_key(&job.id) {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
            records.insert(
                job.id.clone(),
                MockRecord {
                    source: source.to_string(),
                    active: true,
                },
            );
        }

        for (id, record) in records.iter_mut() {
            if record.source == source && record.active && !fresh_ids.contains(&id.as_str()) {
                record.active = false;
                summary.deactivated += 1;
            }
        }

        Ok(summary)
    }

    async fn record_run(&self, run: &NewScrapeRun) -> Result<(), AppError> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Build a normalized job with a properly computed id and no date.
pub fn make_job(company: &str, title: &str, location: &str) -> NormalizedJob {
    NormalizedJob {
        id: compute_id(company, title, location, None),
        company_name: company.to_string(),
        job_title: title.to_string(),
        location: location.to_string(),
        publish_date: None,
        url: format!(
            "https://careers.example.com/{}",
            crate::identity::slugify(title)
        ),
        source: crate::identity::slugify(company),
        description: None,
        contract_type: None,
        degraded: false,
    }
}

/// Same as [`make_job`] but with a publish date folded into the id.
pub fn make_job_with_date(
    company: &str,
    title: &str,
    location: &str,
    date: chrono::NaiveDate,
) -> NormalizedJob {
    let mut job = make_job(company, title, location);
    job.publish_date = Some(date);
    job.id = compute_id(company, title, location, Some(date));
    job
}
