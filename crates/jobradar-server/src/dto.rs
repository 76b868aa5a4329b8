use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use jobradar_core::cache::CacheStatus;
use jobradar_core::models::{NormalizedJob, SourceError};

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListJobsQuery {
    /// Comma-separated company names to include
    pub companies: Option<String>,
    /// Comma-separated locations to include
    pub locations: Option<String>,
    /// Case-insensitive substring search
    pub search: Option<String>,
    /// Bypass the cache and force a fresh aggregation run
    pub refresh: Option<bool>,
}

impl ListJobsQuery {
    pub fn filters(&self) -> jobradar_core::JobFilters {
        jobradar_core::JobFilters {
            companies: split_csv(self.companies.as_deref()),
            locations: split_csv(self.locations.as_deref()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobDto {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub publish_date: Option<NaiveDate>,
    pub url: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    /// True when the record came from a last-known-good dataset.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl From<NormalizedJob> for JobDto {
    fn from(job: NormalizedJob) -> Self {
        Self {
            id: job.id,
            company_name: job.company_name,
            job_title: job.job_title,
            location: job.location,
            publish_date: job.publish_date,
            url: job.url,
            source: job.source,
            description: job.description,
            contract_type: job.contract_type,
            degraded: job.degraded,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SourceErrorDto {
    pub source: String,
    pub message: String,
    pub endpoint: String,
}

impl From<SourceError> for SourceErrorDto {
    fn from(e: SourceError) -> Self {
        Self {
            source: e.source,
            message: e.message,
            endpoint: e.endpoint,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CacheStatusDto {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
}

impl From<CacheStatus> for CacheStatusDto {
    fn from(s: CacheStatus) -> Self {
        Self {
            cached: s.cached,
            age_seconds: s.age_seconds,
            job_count: s.job_count,
            remaining_seconds: s.remaining_seconds,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JobsResponse {
    pub jobs: Vec<JobDto>,
    pub last_updated: DateTime<Utc>,
    pub total_count: usize,
    /// `"cache"` or `"fresh"`
    pub source: &'static str,
    pub cache_status: CacheStatusDto,
    pub errors: Vec<SourceErrorDto>,
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    pub total_count: usize,
    pub errors: Vec<SourceErrorDto>,
    pub last_updated: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Filters & stats
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FilterOptionsResponse {
    pub companies: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    pub total_active: i64,
    pub by_company: Vec<CompanyCountDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CompanyCountDto {
    pub company_name: String,
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Epoch milliseconds as written by the cache/service layer.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}
