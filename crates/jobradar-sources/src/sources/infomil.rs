//! Infomil — Gestmax-hosted search page.
//!
//! The listing carries no usable DOM structure, so postings are recovered
//! from the rendered text: a title containing a role keyword, an optional
//! `DD/MM/YYYY` date, then a `Lieu : ...` location. A tagged
//! last-known-good dataset stands in when the page parses to nothing.

use std::sync::LazyLock;

use regex::Regex;

use jobradar_core::error::AppError;
use jobradar_core::identity;
use jobradar_core::models::{NormalizedJob, RawPosting};
use jobradar_core::traits::{Fetcher, JobSource};

use super::strip_html_tags;

const ENDPOINT: &str = "https://infomil.gestmax.fr/search";
const COMPANY: &str = "Infomil";
const SOURCE: &str = "infomil";
const DEFAULT_LOCATION: &str = "Toulouse (31)";

static POSTING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([^,\n]{2,120}?(?:H/F|consultant|ingénieur|technicien|responsable|employé|assistant)[^,\n]{0,40}?)\s*(?:\(Nouvelle fenêtre\))?\s*(\d{2}/\d{2}/\d{4})?\s*Lieu\s*:\s*([^,\n]+)",
    )
    .expect("static regex")
});

pub struct InfomilSource<F> {
    fetcher: F,
}

impl<F: Fetcher> InfomilSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    fn extract(&self, html: &str) -> Vec<NormalizedJob> {
        let text = strip_html_tags(html);

        let mut jobs = Vec::new();
        for caps in POSTING_RE.captures_iter(&text) {
            let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if title.len() <= 5 {
                continue;
            }

            let raw = RawPosting {
                title: title.to_string(),
                location: caps
                    .get(3)
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
                date: caps.get(2).map(|m| m.as_str().to_string()),
                url: ENDPOINT.to_string(),
                description: None,
                contract_type: None,
            };
            if let Some(job) = identity::normalize(COMPANY, SOURCE, &raw) {
                jobs.push(job);
            }
        }
        jobs
    }
}

#[async_trait::async_trait]
impl<F: Fetcher + 'static> JobSource for InfomilSource<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        let html = self.fetcher.fetch(ENDPOINT).await?;

        let jobs = self.extract(&html);
        if jobs.is_empty() {
            tracing::warn!("Infomil search page parsed to nothing, serving degraded dataset");
            return Ok(degraded_jobs());
        }

        tracing::debug!(count = jobs.len(), "Infomil postings extracted");
        Ok(jobs)
    }
}

/// Last-known-good postings, tagged degraded. Dates are pinned so the
/// derived ids stay stable across runs.
fn degraded_jobs() -> Vec<NormalizedJob> {
    const KNOWN: [(&str, &str); 4] = [
        ("Consultant fonctionnel H/F", "2025-07-24"),
        ("Ingénieur projet maîtrise d'ouvrage H/F", "2025-07-23"),
        ("Technicien support informatique H/F", "2025-07-18"),
        ("Responsable d'équipe support H/F", "2025-07-21"),
    ];

    KNOWN
        .iter()
        .filter_map(|(title, date)| {
            let raw = RawPosting {
                title: title.to_string(),
                location: DEFAULT_LOCATION.to_string(),
                date: Some(date.to_string()),
                url: ENDPOINT.to_string(),
                description: None,
                contract_type: None,
            };
            identity::normalize(COMPANY, SOURCE, &raw).map(|mut job| {
                job.degraded = true;
                job
            })
        })
        .collect()
}
