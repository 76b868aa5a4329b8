//! Identity & normalization: pure functions that clean raw extracted
//! postings and derive stable identifiers from their semantic content.
//!
//! Everything here is deterministic and infallible — unparseable optional
//! fields degrade to absent, and a posting whose required fields are empty
//! after cleaning is rejected by returning `None`, never by erroring.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::models::{NormalizedJob, RawPosting};

/// Sentinel mixed into the id hash when the source exposes no publish date.
const NO_DATE: &str = "no-date";

/// Hex length of the truncated content digest in a job id.
const ID_HASH_LEN: usize = 16;

/// Clean scraped display text: decode HTML entities, strip leading
/// bullet/dash noise, collapse runs of whitespace.
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let stripped = decoded.trim_start_matches(['-', '•', '·', '*', ' ', '\t']);
    collapse_whitespace(stripped)
}

/// Lowercased comparison key: entity-decoded, punctuation stripped,
/// whitespace collapsed. Used for hashing, not for display.
fn normalize_key(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw).to_lowercase();
    let kept: String = decoded
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&kept)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL-safe slug of a company name, used as the readable id prefix.
pub fn slugify(company: &str) -> String {
    let key = normalize_key(company);
    let slug: String = key
        .chars()
        .map(|c| if c == ' ' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if slug.is_empty() {
        "unknown".to_string()
    } else {
        slug
    }
}

/// Parse a publish date as sources print them, canonicalized to a calendar
/// date. Accepted forms: `YYYY-MM-DD`, `DD/MM/YYYY`, `YYYY/MM/DD`, and
/// RFC 3339 timestamps (date part kept). Anything else is absent.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Some(d);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

/// Derive the stable identifier for a posting from its semantic content.
///
/// Hashes the normalized (company, title, location, date-or-sentinel)
/// tuple with SHA-256, truncated to [`ID_HASH_LEN`] hex chars, prefixed
/// with the company slug for readability.
///
/// Two postings with identical company/title/location but different
/// publish dates get distinct ids: a site may repost the same role later,
/// and those are separate postings.
pub fn compute_id(
    company: &str,
    title: &str,
    location: &str,
    publish_date: Option<NaiveDate>,
) -> String {
    let date_key = publish_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NO_DATE.to_string());

    let tuple = format!(
        "{}|{}|{}|{}",
        normalize_key(company),
        normalize_key(title),
        normalize_key(location),
        date_key
    );

    let mut hasher = Sha256::new();
    hasher.update(tuple.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}", slugify(company), &digest[..ID_HASH_LEN])
}

/// Clean a raw extracted posting into a [`NormalizedJob`].
///
/// Returns `None` when any required field (company, title, location) is
/// empty after cleaning — the calling adapter drops the record. Optional
/// fields that fail to parse degrade to `None`.
pub fn normalize(company: &str, source: &str, raw: &RawPosting) -> Option<NormalizedJob> {
    let company_name = clean_text(company);
    let job_title = clean_text(&raw.title);
    let location = clean_text(&raw.location);

    if company_name.is_empty() || job_title.is_empty() || location.is_empty() {
        return None;
    }

    let publish_date = raw.date.as_deref().and_then(parse_publish_date);

    Some(NormalizedJob {
        id: compute_id(&company_name, &job_title, &location, publish_date),
        company_name,
        job_title,
        location,
        publish_date,
        url: raw.url.trim().to_string(),
        source: source.to_string(),
        description: raw
            .description
            .as_deref()
            .map(clean_text)
            .filter(|d| !d.is_empty()),
        contract_type: raw
            .contract_type
            .as_deref()
            .map(clean_text)
            .filter(|c| !c.is_empty()),
        degraded: false,
    })
}
