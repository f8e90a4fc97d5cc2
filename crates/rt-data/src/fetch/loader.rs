//! Version-tagged population of the series store

use std::sync::Arc;
use std::time::Duration;

use rt_core::{LogEntry, Sample, Series, SeriesKey, TimeRange};
use tokio::task::JoinSet;

use super::{FetchError, LogFetcher, SampleFetcher, SeriesRequest};
use crate::config::SeriesSpec;
use crate::store::{ReplaceOutcome, SeriesStore};

/// Outcome of one series load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub version: u64,
    pub outcome: ReplaceOutcome,
    /// Series that could not be fetched; their panes show "no data"
    pub failures: Vec<(SeriesKey, FetchError)>,
    /// Duplicate timestamps dropped while normalizing
    pub dropped_duplicates: usize,
}

impl LoadReport {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, ReplaceOutcome::Applied { .. })
    }

    /// Any failure the host may offer to retry
    pub fn is_retryable(&self) -> bool {
        self.failures.iter().any(|(_, error)| error.is_retryable())
    }
}

/// Sort samples by time and drop duplicate timestamps, keeping the last one.
///
/// Returns the cleaned samples and the number of samples removed.
pub fn normalize_samples(mut samples: Vec<Sample>) -> (Vec<Sample>, usize) {
    if samples.windows(2).any(|pair| pair[1].timestamp < pair[0].timestamp) {
        samples.sort_by_key(|sample| sample.timestamp);
    }

    let mut out: Vec<Sample> = Vec::with_capacity(samples.len());
    let mut removed = 0;
    for sample in samples {
        match out.last_mut() {
            Some(last) if last.timestamp == sample.timestamp => {
                *last = sample;
                removed += 1;
            }
            _ => out.push(sample),
        }
    }
    (out, removed)
}

/// Drives the fetch collaborators and hands their results to the store
pub struct SessionLoader {
    samples: Arc<dyn SampleFetcher>,
    logs: Arc<dyn LogFetcher>,
    store: Arc<SeriesStore>,
    timeout: Duration,
}

impl SessionLoader {
    pub fn new(
        samples: Arc<dyn SampleFetcher>,
        logs: Arc<dyn LogFetcher>,
        store: Arc<SeriesStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            samples,
            logs,
            store,
            timeout,
        }
    }

    pub fn store(&self) -> &Arc<SeriesStore> {
        &self.store
    }

    /// Fetch every configured series concurrently and replace the store.
    ///
    /// The request is tagged with a fresh version before any fetch starts; if
    /// a newer load completes first, this one is reported as stale. Series
    /// that fail are left out of the new snapshot.
    pub async fn load_series(
        &self,
        specs: &[SeriesSpec],
        range: TimeRange,
        interval_ms: u64,
    ) -> LoadReport {
        let version = self.store.next_request_version();
        tracing::info!(version, series = specs.len(), "loading series");

        let mut tasks = JoinSet::new();
        for (position, spec) in specs.iter().enumerate() {
            let fetcher = self.samples.clone();
            let timeout = self.timeout;
            let request = SeriesRequest {
                key: spec.key.clone(),
                range,
                interval_ms,
            };
            tasks.spawn(async move {
                let result = match tokio::time::timeout(timeout, fetcher.fetch_series(&request)).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout(timeout)),
                };
                (position, result)
            });
        }

        let mut slots: Vec<Option<Series>> = vec![None; specs.len()];
        let mut failures = Vec::new();
        let mut dropped_duplicates = 0;

        while let Some(joined) = tasks.join_next().await {
            let (position, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!("series fetch task failed: {}", e);
                    continue;
                }
            };
            let spec = &specs[position];
            match result {
                Ok(samples) => {
                    let (samples, removed) = normalize_samples(samples);
                    if removed > 0 {
                        tracing::warn!(series = %spec.key, removed, "dropped duplicate timestamps");
                    }
                    dropped_duplicates += removed;
                    match spec.build_series(samples) {
                        Ok(series) => slots[position] = Some(series),
                        Err(e) => {
                            tracing::error!("{}", e);
                            failures.push((spec.key.clone(), FetchError::Source(e.to_string())));
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(series = %spec.key, "fetch failed: {}", error);
                    failures.push((spec.key.clone(), error));
                }
            }
        }

        failures.sort_by(|a, b| a.0.cmp(&b.0));
        let series: Vec<Series> = slots.into_iter().flatten().collect();
        let outcome = self.store.replace_series(version, series);

        LoadReport {
            version,
            outcome,
            failures,
            dropped_duplicates,
        }
    }

    /// Fetch the operation log for `range`
    pub async fn load_logs(&self, range: TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        let logs = match tokio::time::timeout(self.timeout, self.logs.fetch_logs(&range)).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
        };
        tracing::info!(entries = logs.len(), "operation log loaded");
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use rt_core::Rgba;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    struct Scripted {
        delay: Duration,
        value: f64,
        failing: Option<&'static str>,
    }

    #[async_trait]
    impl SampleFetcher for Scripted {
        async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError> {
            tokio::time::sleep(self.delay).await;
            if self.failing == Some(request.key.param_id.as_str()) {
                return Err(FetchError::Network("connection reset".to_string()));
            }
            Ok(vec![
                Sample::new(at(2), self.value),
                Sample::new(at(0), self.value),
                Sample::new(at(1), self.value),
                Sample::new(at(1), self.value + 1.0),
            ])
        }
    }

    #[async_trait]
    impl LogFetcher for Scripted {
        async fn fetch_logs(&self, _range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
            tokio::time::sleep(self.delay).await;
            Ok(Vec::new())
        }
    }

    fn spec(param: &str) -> SeriesSpec {
        SeriesSpec {
            key: SeriesKey::new("refiner-1", param),
            label: param.to_string(),
            unit: "mm".to_string(),
            color: Rgba::from_rgb(1, 2, 3),
            threshold: None,
        }
    }

    fn loader(store: &Arc<SeriesStore>, fetcher: Scripted, timeout_ms: u64) -> SessionLoader {
        let fetcher = Arc::new(fetcher);
        SessionLoader::new(
            fetcher.clone(),
            fetcher,
            store.clone(),
            Duration::from_millis(timeout_ms),
        )
    }

    #[test]
    fn test_normalize_sorts_and_keeps_last_duplicate() {
        let (samples, removed) = normalize_samples(vec![
            Sample::new(at(1), 1.0),
            Sample::new(at(0), 0.0),
            Sample::new(at(1), 2.0),
        ]);
        assert_eq!(removed, 1);
        assert_eq!(samples, vec![Sample::new(at(0), 0.0), Sample::new(at(1), 2.0)]);
    }

    #[tokio::test]
    async fn test_load_applies_and_reports_failures() {
        let store = Arc::new(SeriesStore::new());
        let fetcher = Scripted {
            delay: Duration::from_millis(1),
            value: 4.0,
            failing: Some("freeness"),
        };
        let loader = loader(&store, fetcher, 1_000);

        let report = loader
            .load_series(&[spec("gap"), spec("freeness")], TimeRange::new(at(0), at(10)), 1_000)
            .await;

        assert!(report.is_applied());
        assert!(report.is_retryable());
        assert_eq!(report.dropped_duplicates, 1);
        assert_eq!(report.failures.len(), 1);

        let gap = store.series(&SeriesKey::new("refiner-1", "gap")).unwrap();
        assert_eq!(gap.len(), 3);
        assert_eq!(gap.samples()[1].value, 5.0);
        assert_eq!(gap.unit, "mm");
        assert!(store.series(&SeriesKey::new("refiner-1", "freeness")).is_none());
    }

    #[tokio::test]
    async fn test_slow_superseded_load_is_stale() {
        let store = Arc::new(SeriesStore::new());
        let slow = loader(
            &store,
            Scripted { delay: Duration::from_millis(150), value: 1.0, failing: None },
            5_000,
        );
        let fast = loader(
            &store,
            Scripted { delay: Duration::from_millis(1), value: 2.0, failing: None },
            5_000,
        );
        let range = TimeRange::new(at(0), at(10));
        let specs = [spec("gap")];

        let slow_load = slow.load_series(&specs, range, 1_000);
        let fast_load = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            fast.load_series(&specs, range, 1_000).await
        };
        let (slow_report, fast_report) = tokio::join!(slow_load, fast_load);

        assert!(fast_report.is_applied());
        assert!(matches!(slow_report.outcome, ReplaceOutcome::Stale { .. }));
        let gap = store.series(&SeriesKey::new("refiner-1", "gap")).unwrap();
        assert_eq!(gap.samples()[0].value, 2.0);
    }

    #[tokio::test]
    async fn test_timeouts_become_fetch_errors() {
        let store = Arc::new(SeriesStore::new());
        let loader = loader(
            &store,
            Scripted { delay: Duration::from_millis(300), value: 1.0, failing: None },
            20,
        );

        let report = loader
            .load_series(&[spec("gap")], TimeRange::new(at(0), at(10)), 1_000)
            .await;
        assert!(matches!(report.failures[0].1, FetchError::Timeout(_)));
        assert!(store.snapshot().is_empty());

        let logs = loader.load_logs(TimeRange::new(at(0), at(10))).await;
        assert!(matches!(logs, Err(FetchError::Timeout(_))));
    }
}
