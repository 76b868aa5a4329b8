//! Berger-Levrault — ASP.NET job list, page-number pagination.
//!
//! Postings are `li.ts-offer-list-item` elements; whether another page
//! exists is only knowable from the current page's pagination block, so
//! pages are fetched strictly in order.

use std::time::Duration;

use scraper::{Html, Selector};

use jobradar_core::error::AppError;
use jobradar_core::identity;
use jobradar_core::models::{NormalizedJob, RawPosting};
use jobradar_core::traits::{Fetcher, JobSource};

const BASE_URL: &str = "https://recrute.berger-levrault.com";
const LIST_URL: &str = "https://recrute.berger-levrault.com/job/list-of-all-jobs.aspx";
const COMPANY: &str = "Berger-Levrault";
const SOURCE: &str = "berger-levrault";

const MAX_PAGES: usize = 20;
const PAGE_DELAY: Duration = Duration::from_millis(1500);

pub struct BergerLevraultSource<F> {
    fetcher: F,
    page_delay: Duration,
}

impl<F: Fetcher> BergerLevraultSource<F> {
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
        format!("{LIST_URL}?all=1&mode=list&page={page}&LCID=2057")
    }

    fn extract(&self, html: &str) -> (Vec<NormalizedJob>, bool) {
        let document = Html::parse_document(html);
        let items = Selector::parse("li.ts-offer-list-item").expect("static selector");
        let title_link = Selector::parse("a[title]").expect("static selector");

        let mut jobs = Vec::new();
        for item in document.select(&items) {
            let Some(link) = item.select(&title_link).next() else {
                continue;
            };
            let title = link
                .value()
                .attr("title")
                .map(str::to_string)
                .unwrap_or_else(|| link.text().collect::<String>());

            let url = match link.value().attr("href") {
                Some(href) if href.starts_with("http") => href.to_string(),
                Some(href) => format!("{BASE_URL}{href}"),
                None => format!("{BASE_URL}/"),
            };

            let raw = RawPosting {
                title,
                // The list view carries no location; detail pages do, but
                // one request per posting is not worth it here.
                location: "France".to_string(),
                date: None,
                url,
                description: None,
                contract_type: Some("CDI".to_string()),
            };
            if let Some(job) = identity::normalize(COMPANY, SOURCE, &raw) {
                jobs.push(job);
            }
        }

        (jobs, has_next_page(&document))
    }
}

#[async_trait::async_trait]
impl<F: Fetcher + 'static> JobSource for BergerLevraultSource<F> {
    fn name(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> String {
        LIST_URL.to_string()
    }

    async fn fetch_jobs(&self) -> Result<Vec<NormalizedJob>, AppError> {
        let mut jobs = Vec::new();

        for page in 1..=MAX_PAGES {
            let html = self.fetcher.fetch(&self.page_url(page)).await?;
            let (page_jobs, has_next) = self.extract(&html);

            tracing::debug!(page, count = page_jobs.len(), has_next, "Berger-Levrault page");

            if page_jobs.is_empty() {
                break;
            }
            jobs.extend(page_jobs);

            if !has_next {
                break;
            }
            if page == MAX_PAGES {
                tracing::warn!("Berger-Levrault pagination ceiling reached, keeping partial set");
                break;
            }
            tokio::time::sleep(self.page_delay).await;
        }

        if jobs.is_empty() {
            return Err(AppError::ParseError(
                "no postings found in Berger-Levrault list".into(),
            ));
        }

        Ok(jobs)
    }
}

fn has_next_page(document: &Html) -> bool {
    let next_rel = Selector::parse(r#".pagination a[rel="next"]"#).expect("static selector");
    document.select(&next_rel).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobradar_core::testutil::MockFetcher;

    fn list_page(titles: &[&str], with_next: bool) -> String {
        let items: String = titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                format!(
                    r#"<li class="ts-offer-list-item offerlist-item">
                         <a title="{t}" href="/offre-de-emploi/emploi-{i}_574{i}.aspx">{t}</a>
                       </li>"#
                )
            })
            .collect();
        let pagination = if with_next {
            r#"<div class="pagination"><a rel="next" href="?page=2">Next</a></div>"#
        } else {
            r#"<div class="pagination"></div>"#
        };
        format!("<html><body><ul>{items}</ul>{pagination}</body></html>")
    }

    #[tokio::test]
    async fn extracts_postings_from_list_items() {
        let page = list_page(&["Technicien formateur logiciel F/H"], false);
        let source = BergerLevraultSource::new(MockFetcher::new(&page)).without_delay();

        let jobs = source.fetch_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_title, "Technicien formateur logiciel F/H");
        assert_eq!(jobs[0].company_name, "Berger-Levrault");
        assert!(jobs[0].url.starts_with(BASE_URL));
    }

    #[tokio::test]
    async fn follows_next_control_until_it_disappears() {
        let page1 = list_page(&["Technicien formateur logiciel F/H"], true);
        let page2 = list_page(&["Développeur Angular F/H"], false);
        let fetcher = MockFetcher::with_pages(vec![&page1, &page2]);
        let source = BergerLevraultSource::new(fetcher.clone()).without_delay();

        let jobs = source.fetch_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);

        let urls = fetcher.requested_urls.lock().unwrap().clone();
        assert!(urls[0].contains("page=1"));
        assert!(urls[1].contains("page=2"));
    }

    #[tokio::test]
    async fn empty_list_is_an_error() {
        let source = BergerLevraultSource::new(MockFetcher::new("<html><body></body></html>"))
            .without_delay();
        let err = source.fetch_jobs().await.unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let source = BergerLevraultSource::new(MockFetcher::with_error(AppError::HttpError(
            "HTTP 503 for berger-levrault".into(),
        )))
        .without_delay();
        assert!(source.fetch_jobs().await.unwrap_err().is_transport());
    }
}
