//! Error types shared across the workspace

use thiserror::Error;

use crate::model::{LogId, SeriesKey};

/// Errors raised by the core model and viewport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid viewport [{start}, {end}] with minimum gap {min_gap}")]
    InvalidViewport { start: f64, end: f64, min_gap: f64 },

    #[error("minimum gap {0} must lie in (0, 100]")]
    InvalidMinGap(f64),

    #[error("series {key}: sample {index} is not after its predecessor")]
    UnorderedSamples { key: SeriesKey, index: usize },
}

/// A sample that cannot be drawn (non-finite value)
#[derive(Error, Debug, Clone, PartialEq)]
#[error("series {series_key}: non-finite sample at index {index}")]
pub struct DataError {
    pub series_key: SeriesKey,
    /// Absolute index of the sample in its series
    pub index: usize,
}

/// Overlapping correlation ranges detected while building an index
#[derive(Error, Debug, Clone, PartialEq)]
#[error("series {series_key}: overlapping log ranges {conflicting_ids:?}")]
pub struct ValidationError {
    pub series_key: SeriesKey,
    pub conflicting_ids: Vec<LogId>,
}
