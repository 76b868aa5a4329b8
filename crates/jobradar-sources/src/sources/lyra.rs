//! Lyra — WordPress REST API (`offer_type` custom post type).
//!
//! Page-number pagination, 12 postings per page; the API 404s past the
//! last page, which is an end-of-data signal rather than a failure.

use std::time::Duration;

use serde::Deserialize;

use jobradar_core::error::AppError;
use jobradar_core::identity;
use jobradar_core::models::{NormalizedJob, RawPosting};
use jobradar_core::traits::{Fetcher, JobSource};

use super::{guess_french_city, strip_html_tags};

const ENDPOINT: &str = "https://www.lyra.com/fr/wp-json/wp/v2/offer_type";
const COMPANY: &str = "Lyra Network";
const SOURCE: &str = "lyra";

const PER_PAGE: usize = 12;
const MAX_PAGES: usize = 20;
const PAGE_DELAY: Duration = Duration::from_millis(1000);

pub struct LyraSource<F> {
    fetcher: F,
    page_delay: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Offer {
    id: u64,
    link: String,
    title: Rendered,
    excerpt: Rendered,
    formatted_date_gmt: Option<String>,
    lyra_departments: Vec<Department>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Rendered {
    rendered: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Department {
    name: String,
}

impl<F: Fetcher> LyraSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            page_delay: PAGE_DELAY,
        }
    }

    /// Drop the inter-page delay for tests.
    pub fn without_delay(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self
    }

    fn page_url(&self, page: usize) -> String {
        format!(
            "{ENDPOINT}?page={page}&per_page={PER_PAGE}&_fields=id,title,excerpt,link,formatted_date_gmt,lyra_departments"
        )
    }

    fn convert(&self, offer: &Offer) -> Option<NormalizedJob> {
        if offer.id == 0 || offer.link.is_empty() {
            return None;
        }
        let title = strip_html_tags(&offer.title.rendered);
        // Navigation chrome and teasers surface as very short "titles".
        if title.trim().len() < 3 {
            return None;
        }

        let raw = RawPosting {
            location: extract_location(offer, &title),
            title,
            date: offer.formatted_date_gmt.clone(),
            url: offer.link.clone(),
            description: Some(strip_html_tags(&offer.excerpt.rendered))
                .filter(|d| !d.trim().is_empty())
                .map(|d| d.chars().take(200).collect()),
            contract_type: None,
        };

        identity::normalize(COMPANY, SOURCE, &raw)
    }
}

#[async_trait::async_trait]
impl<F: Fetcher + 'static> JobSource for LyraSource<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        let mut jobs = Vec::new();

        for page in 1..=MAX_PAGES {
            let body = match self.fetcher.fetch(&self.page_url(page)).await {
                Ok(body) => body,
                // WP answers 404 ("rest_post_invalid_page_number") past the
                // last page; everything up to here is the complete set.
                Err(AppError::HttpError(msg)) if page > 1 && msg.contains("HTTP 404") => {
                    tracing::debug!(page, "Lyra pagination ended with 404");
                    break;
                }
                Err(e) => return Err(e),
            };

            let offers: Vec<Offer> = serde_json::from_str(&body)
                .map_err(|e| AppError::ParseError(format!("Lyra offers payload: {e}")))?;

            tracing::debug!(page, offers = offers.len(), "Lyra page fetched");

            if offers.is_empty() {
                break;
            }

            let short_page = offers.len() < PER_PAGE;
            jobs.extend(offers.iter().filter_map(|o| self.convert(o)));

            if short_page {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!("Lyra pagination ceiling reached, keeping partial set");
                break;
            }
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(jobs)
    }
}

/// Department names sometimes carry the office city; otherwise look in the
/// title and link, and fall back to the head office.
fn extract_location(offer: &Offer, title: &str) -> String {
    for dept in &offer.lyra_departments {
        if let Some(city) = guess_french_city(&dept.name) {
            return city.to_string();
        }
    }
    if let Some(city) = guess_french_city(title) {
        return city.to_string();
    }
    if let Some(city) = guess_french_city(&offer.link) {
        return city.to_string();
    }
    "Toulouse".to_string()
}
