//! Series storage, windowing, correlation and data sources

pub mod config;
pub mod correlation;
pub mod fetch;
pub mod sources;
pub mod store;

use rt_core::CoreError;
use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use config::{ChartSpec, PaneSpec, SeriesSpec, SessionConfig, SourceConfig};
pub use correlation::{CorrelationIndex, CorrelationLink};
pub use fetch::{FetchError, LogFetcher, SampleFetcher, SeriesRequest, SessionLoader, LoadReport};
pub use sources::{CsvSampleFetcher, JsonLogFetcher};
pub use rt_core::{Padding, YDomain};
pub use store::{
    visible_slice, y_domain, InsufficientData, ReplaceOutcome, SeriesStore, StoreSnapshot,
    VisibleSlice, DEFAULT_Y_MARGIN_RATIO,
};

/// Errors that can occur while reading configuration or file sources
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp '{value}' on line {line}")]
    Timestamp { value: String, line: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Series(#[from] CoreError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl From<csv::Error> for SourceError {
    fn from(error: csv::Error) -> Self {
        match error.kind() {
            csv::ErrorKind::Io(io_err) => {
                SourceError::Io(std::io::Error::new(io_err.kind(), error.to_string()))
            }
            _ => SourceError::Csv(error.to_string()),
        }
    }
}
