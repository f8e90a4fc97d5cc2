use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use rt_core::{Sample, SeriesKey};

use crate::config::NullConfig;
use crate::fetch::{FetchError, SampleFetcher, SeriesRequest};
use crate::SourceError;

/// Reads one CSV file per series from a directory.
///
/// Files are named `<device>__<param>.csv` and hold a `timestamp,value` header
/// followed by RFC 3339 timestamps and numbers. Missing cells become NaN.
pub struct CsvSampleFetcher {
    dir: PathBuf,
    nulls: NullConfig,
}

impl CsvSampleFetcher {
    pub fn new(dir: impl Into<PathBuf>, nulls: NullConfig) -> Self {
        Self {
            dir: dir.into(),
            nulls,
        }
    }

    /// File holding the samples of `key`
    pub fn path_for(&self, key: &SeriesKey) -> PathBuf {
        self.dir
            .join(format!("{}__{}.csv", key.device_id, key.param_id))
    }
}

/// Parse a whole sample file
pub fn read_samples(path: &Path, nulls: &NullConfig) -> Result<Vec<Sample>, SourceError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut samples = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let raw_time = record.get(0).unwrap_or_default();
        let raw_value = record.get(1).unwrap_or_default();

        let timestamp = DateTime::parse_from_rfc3339(raw_time)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| SourceError::Timestamp {
                value: raw_time.to_string(),
                line,
            })?;
        let value = nulls.parse_value(raw_value).ok_or_else(|| {
            SourceError::Csv(format!("invalid value '{}' on line {}", raw_value, line))
        })?;

        samples.push(Sample::new(timestamp, value));
    }

    tracing::debug!(path = %path.display(), samples = samples.len(), "sample file read");
    Ok(samples)
}

/// Keep samples at least `interval_ms` apart, starting with the first one
pub fn thin_to_interval(samples: Vec<Sample>, interval_ms: u64) -> Vec<Sample> {
    if interval_ms == 0 {
        return samples;
    }
    let interval = Duration::milliseconds(interval_ms as i64);
    let mut kept: Vec<Sample> = Vec::with_capacity(samples.len());
    for sample in samples {
        match kept.last() {
            Some(last) if sample.timestamp - last.timestamp < interval => {}
            _ => kept.push(sample),
        }
    }
    kept
}

#[async_trait]
impl SampleFetcher for CsvSampleFetcher {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError> {
        let path = self.path_for(&request.key);
        let nulls = self.nulls.clone();

        let samples = tokio::task::spawn_blocking(move || read_samples(&path, &nulls))
            .await
            .map_err(|e| FetchError::Source(e.to_string()))?
            .map_err(|e| FetchError::Source(e.to_string()))?;

        let in_range = samples
            .into_iter()
            .filter(|sample| request.range.contains(sample.timestamp))
            .collect();
        Ok(thin_to_interval(in_range, request.interval_ms))
    }
}
