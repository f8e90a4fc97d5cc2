use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rt_core::{LogEntry, TimeRange};

use crate::fetch::{FetchError, LogFetcher};
use crate::SourceError;

/// Reads the operation log from a JSON array of log entries
pub struct JsonLogFetcher {
    path: PathBuf,
}

impl JsonLogFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(path: &Path) -> Result<Vec<LogEntry>, SourceError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl LogFetcher for JsonLogFetcher {
    async fn fetch_logs(&self, range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        let path = self.path.clone();
        let entries = tokio::task::spawn_blocking(move || Self::read_all(&path))
            .await
            .map_err(|e| FetchError::Source(e.to_string()))?
            .map_err(|e| FetchError::Source(e.to_string()))?;

        // Keep every entry that overlaps the requested range
        Ok(entries
            .into_iter()
            .filter(|entry| entry.start_time <= range.end && entry.end_time >= range.start)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rt_core::{ActionType, LogId, LogSource};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn entry(id: u64, start: i64) -> LogEntry {
        LogEntry {
            id: LogId(id),
            start_time: at(start),
            end_time: at(start + 10),
            device_id: "refiner-1".to_string(),
            action: ActionType::Retract,
            value_delta: -0.02,
            duration_seconds: 10.0,
            source: LogSource::Manual,
        }
    }

    #[tokio::test]
    async fn test_fetch_keeps_overlapping_entries() {
        let path = std::env::temp_dir().join(format!("rt-logs-{}.json", std::process::id()));
        let entries = vec![entry(1, 0), entry(2, 100), entry(3, 195)];
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let fetcher = JsonLogFetcher::new(&path);
        let logs = fetcher.fetch_logs(&TimeRange::new(at(50), at(200))).await.unwrap();
        std::fs::remove_file(&path).ok();

        let ids: Vec<_> = logs.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![LogId(2), LogId(3)]);
    }
}
