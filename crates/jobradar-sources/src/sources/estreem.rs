//! Estreem — TeamTailor-hosted careers page, single HTML listing.
//!
//! TeamTailor renders postings as `/jobs/...` anchors mixed with a lot of
//! navigation chrome; a keyword/length heuristic separates the two. When
//! the page yields nothing (TeamTailor ships markup changes regularly) a
//! tagged last-known-good dataset stands in so the source does not blank
//! out of the aggregate view.

use scraper::{Html, Selector};

use jobradar_core::error::AppError;
use jobradar_core::identity;
use jobradar_core::models::{NormalizedJob, RawPosting};
use jobradar_core::traits::{Fetcher, JobSource};

const BASE_URL: &str = "https://partecis.teamtailor.com";
const COMPANY: &str = "Estreem";
const SOURCE: &str = "estreem";
const DEFAULT_LOCATION: &str = "Paris - Bercy Village";

/// Words that appear in real posting titles but never in site chrome.
const TITLE_MARKERS: [&str; 5] = ["H/F", "F/H", "Manager", "Engineer", "Director"];

pub struct EstreemSource<F> {
    fetcher: F,
}

impl<F: Fetcher> EstreemSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    fn extract(&self, html: &str) -> Vec<NormalizedJob> {
        let document = Html::parse_document(html);
        let anchors = Selector::parse(r#"a[href*="/jobs/"]"#).expect("static selector");

        let mut jobs = Vec::new();
        for anchor in document.select(&anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let text = anchor.text().collect::<String>();
            let text = text.trim();

            if !looks_like_posting(text) {
                continue;
            }

            let raw = RawPosting {
                title: text.to_string(),
                location: DEFAULT_LOCATION.to_string(),
                date: None,
                url: absolute_url(href),
                description: None,
                contract_type: Some("Hybride".to_string()),
            };
            if let Some(job) = identity::normalize(COMPANY, SOURCE, &raw) {
                jobs.push(job);
            }
        }
        jobs
    }
}

#[async_trait::async_trait]
impl<F: Fetcher + 'static> JobSource for EstreemSource<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> String {
        format!("{BASE_URL}/jobs")
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        // A transport failure fails the source; only a reachable page that
        // parses to nothing degrades to the fallback dataset.
        let html = self.fetcher.fetch(&self.endpoint()).await?;

        let jobs = self.extract(&html);
        if jobs.is_empty() {
            tracing::warn!("Estreem listing parsed to nothing, serving degraded dataset");
            return Ok(degraded_jobs());
        }

        tracing::debug!(count = jobs.len(), "Estreem listing extracted");
        Ok(jobs)
    }
}

fn looks_like_posting(text: &str) -> bool {
    text.len() > 10 && TITLE_MARKERS.iter().any(|marker| text.contains(marker))
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{BASE_URL}{href}")
    }
}

/// Last-known-good postings, tagged degraded so downstream consumers can
/// tell them from live data.
fn degraded_jobs() -> Vec<NormalizedJob> {
    const KNOWN: [(&str, &str, &str); 6] = [
        (
            "Business Analyst Expert Monétique (H/F)",
            "Lyon, Paris - Bercy Village",
            "business-analyst-expert-monetique",
        ),
        (
            "Manager CICD (H/F)",
            "Paris - Bercy Village",
            "manager-cicd",
        ),
        (
            "Site Reliability Engineer (H/F)",
            "Toulouse, Paris - Bercy Village",
            "site-reliability-engineer",
        ),
        (
            "QA Automation Engineer (H/F)",
            "Paris - Bercy Village",
            "qa-automation-engineer",
        ),
        (
            "Software Engineer Java Full Stack (H/F)",
            "Paris - Bercy Village",
            "software-engineer-java-full-stack",
        ),
        (
            "IT Security Director (H/F)",
            "Paris - Bercy Village",
            "it-security-director",
        ),
    ];

    KNOWN
        .iter()
        .filter_map(|(title, location, slug)| {
            let raw = RawPosting {
                title: title.to_string(),
                location: location.to_string(),
                date: None,
                url: format!("{BASE_URL}/jobs/{slug}"),
                description: None,
                contract_type: Some("Hybride".to_string()),
            };
            identity::normalize(COMPANY, SOURCE, &raw).map(|mut job| {
                job.degraded = true;
                job
            })
        })
        .collect()
}
