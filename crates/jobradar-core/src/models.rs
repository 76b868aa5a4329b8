use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One posting as extracted by an adapter, before normalization.
///
/// Field values are raw text exactly as scraped (entities, stray
/// whitespace and all). Produced and discarded within a single
/// adapter call — [`crate::identity::normalize`] turns it into a
/// [`NormalizedJob`] or rejects it.
#[derive(Debug, Clone, Default)]
pub struct RawPosting {
    pub title: String,
    pub location: String,
    /// Publish date as the source prints it (`DD/MM/YYYY`, ISO, ...).
    pub date: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub contract_type: Option<String>,
}

/// The canonical unit of the system: one normalized job posting.
///
/// `id` is deterministically derived from (company, title, location,
/// publish date) — see [`crate::identity::compute_id`]. Two values with
/// equal `id` are the same posting regardless of other field drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub publish_date: Option<NaiveDate>,
    pub url: String,
    /// Tag of the adapter that produced this record.
    pub source: String,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    /// True when this record came from an adapter's last-known-good
    /// dataset instead of live extraction.
    #[serde(default)]
    pub degraded: bool,
}

/// One failed adapter in an aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceError {
    pub source: String,
    pub message: String,
    pub endpoint: String,
}

/// The outcome of one aggregation run: the merged, deduplicated job set
/// plus one [`SourceError`] per adapter that failed. Immutable after
/// construction; partial success is a normal, reportable outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResult {
    pub jobs: Vec<NormalizedJob>,
    pub errors: Vec<SourceError>,
}

impl AggregationResult {
    /// True when no adapter succeeded and the run produced nothing.
    pub fn is_total_failure(&self) -> bool {
        self.jobs.is_empty() && !self.errors.is_empty()
    }

    /// True when the named source contributed an error this run.
    pub fn source_failed(&self, source: &str) -> bool {
        self.errors.iter().any(|e| e.source == source)
    }

    /// Jobs belonging to one source, in merge order.
    pub fn jobs_for_source(&self, source: &str) -> Vec<NormalizedJob> {
        self.jobs
            .iter()
            .filter(|j| j.source == source)
            .cloned()
            .collect()
    }
}

/// A job record as held by the persistent store.
///
/// Superset of [`NormalizedJob`]: `is_active` is the soft-delete flag,
/// flipped to false when a reconciliation pass for the record's source no
/// longer sees its id. Records are never physically deleted by normal
/// operation and reactivate if the posting reappears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredJobRecord {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub publish_date: Option<NaiveDate>,
    pub url: String,
    pub source: String,
    pub description: Option<String>,
    pub contract_type: Option<String>,
    pub is_active: bool,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Counts returned by a reconciliation pass, for observability only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub created: u64,
    pub updated: u64,
    pub deactivated: u64,
}

/// Record of one completed aggregation run, written to the store.
#[derive(Debug, Clone)]
pub struct NewScrapeRun {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_jobs: usize,
    pub errors: Vec<SourceError>,
}

/// Filters accepted by the inbound query interface.
///
/// Company and location filters are exact-match whitelists; `search` is a
/// case-insensitive substring match over company, title, location and
/// description.
#[derive(Debug, Clone, Default)]
pub struct JobFilters {
    pub companies: Vec<String>,
    pub locations: Vec<String>,
    pub search: Option<String>,
}

impl JobFilters {
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty() && self.locations.is_empty() && self.search.is_none()
    }

    pub fn matches(&self, job: &NormalizedJob) -> bool {
        if !self.companies.is_empty() && !self.companies.contains(&job.company_name) {
            return false;
        }
        if !self.locations.is_empty() && !self.locations.contains(&job.location) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = job.company_name.to_lowercase().contains(&term)
                || job.job_title.to_lowercase().contains(&term)
                || job.location.to_lowercase().contains(&term)
                || job
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}
