//! One adapter module per external source.
//!
//! Each adapter owns its transport details, pagination and extraction
//! rules, and hands raw fields to the core identity layer. The shared
//! helpers here cover the two things several sites need: flattening HTML
//! to text and spotting a French office city in free text.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use jobradar_core::traits::JobSource;

use crate::fetcher::ReqwestFetcher;

pub mod berger_levrault;
pub mod bpce;
pub mod estreem;
pub mod infomil;
pub mod lyra;

pub use berger_levrault::BergerLevraultSource;
pub use bpce::BpceSource;
pub use estreem::EstreemSource;
pub use infomil::InfomilSource;
pub use lyra::LyraSource;

/// All production sources, in the order their jobs win dedup ties.
pub fn default_sources(fetcher: &ReqwestFetcher) -> Vec<Arc<dyn JobSource>> {
    vec![
        Arc::new(BpceSource::new(fetcher.clone())),
        Arc::new(LyraSource::new(fetcher.clone())),
        Arc::new(EstreemSource::new(fetcher.clone())),
        Arc::new(InfomilSource::new(fetcher.clone())),
        Arc::new(BergerLevraultSource::new(fetcher.clone())),
    ]
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("static regex"));

/// Flatten markup to text. Tags become newlines so that line-oriented
/// extraction (Infomil) keeps one posting per line; entities are decoded.
pub(crate) fn strip_html_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "\n");
    html_escape::decode_html_entities(text.as_ref()).to_string()
}

const FRENCH_CITIES: [&str; 15] = [
    "Paris",
    "Lyon",
    "Marseille",
    "Toulouse",
    "Lille",
    "Bordeaux",
    "Nice",
    "Nantes",
    "Strasbourg",
    "Montpellier",
    "Grenoble",
    "Rennes",
    "Nancy",
    "Metz",
    "Clermont-Ferrand",
];

/// First known city mentioned in the text, if any.
pub(crate) fn guess_french_city(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    FRENCH_CITIES
        .iter()
        .find(|city| lower.contains(&city.to_lowercase()))
        .copied()
}
