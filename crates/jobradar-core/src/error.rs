use thiserror::Error;

/// Application-wide error types for jobradar.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (non-success status, bad response body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// A source page or API payload could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Cache read/write failed.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error means the source could not be reached at
    /// all, as opposed to being reached but yielding unusable content.
    ///
    /// Adapters use this split to decide between failing outright and
    /// substituting a degraded dataset: transport failures must never be
    /// masked as "zero results".
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::NetworkError(_) | AppError::Timeout(_)
        )
    }
}
