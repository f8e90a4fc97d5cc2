//! Contract with the data-fetch collaborators
//!
//! Fetching is the only asynchronous step of a session. Implementations live
//! outside the core (network clients, file readers, the demo generator); the
//! core only sees these traits.

use std::time::Duration;

use async_trait::async_trait;
use rt_core::{LogEntry, Sample, SeriesKey, TimeRange};
use thiserror::Error;

mod loader;

pub use loader::{normalize_samples, LoadReport, SessionLoader};

/// Failure reported by a fetch collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("source unavailable: {0}")]
    Source(String),
}

impl FetchError {
    /// Whether the host should offer a retry
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Source(_) => false,
        }
    }
}

/// Parameters of one series fetch
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    pub key: SeriesKey,
    pub range: TimeRange,
    /// Requested spacing between samples
    pub interval_ms: u64,
}

/// Fetches the samples of one series
#[async_trait]
pub trait SampleFetcher: Send + Sync {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError>;
}

/// Fetches the operation log for a time range
#[async_trait]
pub trait LogFetcher: Send + Sync {
    async fn fetch_logs(&self, range: &TimeRange) -> Result<Vec<LogEntry>, FetchError>;
}
