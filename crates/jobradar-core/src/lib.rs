pub mod aggregator;
pub mod cache;
pub mod error;
pub mod identity;
pub mod models;
pub mod service;
pub mod testutil;
pub mod traits;

pub use aggregator::Aggregator;
pub use cache::{CacheStatus, JobCache};
pub use error::AppError;
pub use models::{AggregationResult, JobFilters, NormalizedJob, SourceError, StoredJobRecord};
pub use service::{RefreshService, ServedResult};
pub use traits::{Fetcher, JobSource, JobStore, NullStore};
