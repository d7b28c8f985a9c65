use thiserror::Error;

use crate::DataSource;

/// Failures while fetching data from an external source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error while contacting {origin}: {message}")]
    Network { origin: DataSource, message: String },
    #[error("authentication with {origin} failed: {message}")]
    Auth { origin: DataSource, message: String },
    #[error("quota exhausted for {origin}")]
    Quota { origin: DataSource },
    /// No endpoint is configured for the source
    #[error("data source {0} is not configured")]
    UnsupportedSource(DataSource),
}

/// Failures while analysing an area
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("invalid area: {0}")]
    InvalidArea(String),
    #[error("unsupported analysis: {0}")]
    Unsupported(String),
}
