//! Groupe BPCE — Opendatasoft records API.
//!
//! Offset-paginated JSON; the `total_count` field drives the pagination
//! loop. The API is the one source with machine-readable dates, in US
//! `MM/DD/YYYY h:mm:ss AM` form.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;

use jobradar_core::error::AppError;
use jobradar_core::identity;
use jobradar_core::models::{NormalizedJob, RawPosting};
use jobradar_core::traits::{Fetcher, JobSource};

use super::strip_html_tags;

const ENDPOINT: &str =
    "https://bpce.opendatasoft.com/api/explore/v2.1/catalog/datasets/groupe-bpce-offres-emploi/records";
const COMPANY: &str = "BPCE";
const SOURCE: &str = "bpce";

const PAGE_SIZE: usize = 100;
/// Hard ceiling protecting against a runaway `total_count`.
const MAX_RECORDS: usize = 10_000;
const PAGE_DELAY: Duration = Duration::from_millis(300);

pub struct BpceSource<F> {
    fetcher: F,
    page_size: usize,
    page_delay: Duration,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    total_count: usize,
    #[serde(default)]
    results: Vec<JobRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JobRecord {
    title: Option<String>,
    organization: Option<String>,
    city: Option<String>,
    state: Option<String>,
    lastmodifieddate: Option<String>,
    url: Option<String>,
    apply_url: Option<String>,
    description: Option<String>,
    jobtype: Option<String>,
}

impl<F: Fetcher> BpceSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            page_size: PAGE_SIZE,
            page_delay: PAGE_DELAY,
        }
    }

    /// Shrink the page size (and drop the inter-page delay) for tests.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self.page_delay = Duration::ZERO;
        self
    }

    fn page_url(&self, offset: usize) -> String {
        format!(
            "{ENDPOINT}?limit={}&offset={offset}&timezone=UTC",
            self.page_size
        )
    }

    fn convert(&self, record: &JobRecord) -> Option<NormalizedJob> {
        let title = record.title.as_deref()?.trim();
        if title.is_empty() {
            return None;
        }

        // The dataset covers the whole group; surface the actual hiring
        // entity in the title when it is not the holding itself.
        let title = match record.organization.as_deref() {
            Some(org) if !org.is_empty() && org != "Groupe BPCE" => format!("{title} - {org}"),
            _ => title.to_string(),
        };

        let raw = RawPosting {
            title,
            location: format_location(record.city.as_deref(), record.state.as_deref()),
            date: record
                .lastmodifieddate
                .as_deref()
                .and_then(parse_us_datetime)
                .map(|d| d.format("%Y-%m-%d").to_string()),
            url: posting_url(record),
            description: record
                .description
                .as_deref()
                .map(|d| truncate(&strip_html_tags(d), 200)),
            contract_type: Some(record.jobtype.clone().unwrap_or_else(|| "CDI".to_string())),
        };

        identity::normalize(COMPANY, SOURCE, &raw)
    }
}

#[async_trait::async_trait]
impl<F: Fetcher + 'static> JobSource for BpceSource<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        let mut jobs = Vec::new();
        let mut offset = 0;

        loop {
            let body = self.fetcher.fetch(&self.page_url(offset)).await?;
            let page: RecordsResponse = serde_json::from_str(&body)
                .map_err(|e| AppError::ParseError(format!("BPCE records payload: {e}")))?;

            tracing::debug!(
                offset,
                records = page.results.len(),
                total = page.total_count,
                "BPCE page fetched"
            );

            if page.results.is_empty() {
                break;
            }

            let full_page = page.results.len() == self.page_size;
            jobs.extend(page.results.iter().filter_map(|r| self.convert(r)));

            offset += self.page_size;
            if !full_page || offset >= page.total_count {
                break;
            }
            if offset >= MAX_RECORDS {
                tracing::warn!(offset, "BPCE pagination ceiling reached, keeping partial set");
                break;
            }

            tokio::time::sleep(self.page_delay).await;
        }

        if jobs.is_empty() {
            // The dataset always carries postings; an empty parse means the
            // payload shape changed, not that BPCE stopped hiring.
            return Err(AppError::ParseError(
                "no valid postings in BPCE API response".into(),
            ));
        }

        Ok(jobs)
    }
}

fn format_location(city: Option<&str>, state: Option<&str>) -> String {
    match (
        city.filter(|c| !c.is_empty()),
        state.filter(|s| !s.is_empty()),
    ) {
        (Some(city), Some(state)) => format!("{city} ({state})"),
        (Some(city), None) => city.to_string(),
        (None, Some(state)) => state.to_string(),
        (None, None) => "France".to_string(),
    }
}

/// Prefer the official recruitment-site URL over external redirects,
/// falling back to a slug built from the title.
fn posting_url(record: &JobRecord) -> String {
    for candidate in [record.url.as_deref(), record.apply_url.as_deref()]
        .into_iter()
        .flatten()
    {
        if candidate.contains("recrutement.bpce.fr") {
            return candidate.to_string();
        }
    }
    let slug = identity::slugify(record.title.as_deref().unwrap_or_default());
    format!("https://recrutement.bpce.fr/job/{slug}")
}

/// `MM/DD/YYYY h:mm:ss AM` as the dataset prints it; the date part is all
/// that matters.
fn parse_us_datetime(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%m/%d/%Y").ok()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
