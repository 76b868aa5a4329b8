pub mod fetcher;
pub mod sources;

pub use fetcher::ReqwestFetcher;
pub use sources::{
    BergerLevraultSource, BpceSource, EstreemSource, InfomilSource, LyraSource, default_sources,
};
