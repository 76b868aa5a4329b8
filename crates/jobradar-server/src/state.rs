use jobradar_core::RefreshService;
use jobradar_db::{Database, JobRepository};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub service: RefreshService<JobRepository>,
    pub db: Database,
    /// API key protecting the forced-refresh endpoint.
    pub api_key: String,
}
