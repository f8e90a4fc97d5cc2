//! Demo mode for the trend explorer
//! Generates synthetic refiner measurements and knife actions

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rt_core::{ActionType, LogEntry, LogId, LogSource, Sample, TimeRange};
use rt_data::{FetchError, LogFetcher, SampleFetcher, SeriesRequest};

/// Knife actions are scheduled on a fixed 90 minute grid
const ACTION_SLOT_SECS: i64 = 90 * 60;

/// Gap change applied by one knife action, in mm
const ACTION_STEP_MM: f64 = 0.01;

/// Demo data source that generates synthetic data
///
/// Output depends only on the requested range, so repeated loads agree.
pub struct DemoSource {
    latency: Duration,
}

impl DemoSource {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(150),
        }
    }

    /// Knife actions starting inside `range`
    pub fn actions(&self, range: &TimeRange) -> Vec<LogEntry> {
        let first = range.start.timestamp().div_euclid(ACTION_SLOT_SECS) + 1;
        let last = range.end.timestamp().div_euclid(ACTION_SLOT_SECS);

        (first..=last)
            .filter_map(|slot| {
                let start = Utc.timestamp_opt(slot * ACTION_SLOT_SECS, 0).single()?;
                let duration = 300 + slot.rem_euclid(4) * 180;
                let end = Utc.timestamp_opt(slot * ACTION_SLOT_SECS + duration, 0).single()?;
                let advance = slot.rem_euclid(2) == 0;
                Some(LogEntry {
                    id: LogId(slot.unsigned_abs()),
                    start_time: start,
                    end_time: end,
                    device_id: if slot.rem_euclid(3) == 0 {
                        "refiner-2".to_string()
                    } else {
                        "refiner-1".to_string()
                    },
                    action: if advance {
                        ActionType::Advance
                    } else {
                        ActionType::Retract
                    },
                    value_delta: if advance {
                        -ACTION_STEP_MM
                    } else {
                        ACTION_STEP_MM
                    },
                    duration_seconds: duration as f64,
                    source: if slot.rem_euclid(5) == 0 {
                        LogSource::Automatic
                    } else {
                        LogSource::Manual
                    },
                })
            })
            .collect()
    }

    /// Refining gap at `t` after the knife actions seen so far
    fn gap(&self, t: DateTime<Utc>, offset: f64, noise: f64, actions: &[LogEntry]) -> f64 {
        let hours = t.timestamp() as f64 / 3600.0;
        let applied: f64 = actions
            .iter()
            .filter(|entry| entry.end_time <= t)
            .map(|entry| entry.value_delta)
            .sum();
        0.35 + offset + (hours / 3.0).sin() * 0.02 + noise * 0.004 + applied
    }

    fn value(&self, param: &str, device: &str, t: DateTime<Utc>, actions: &[LogEntry]) -> f64 {
        let seed = device.bytes().map(f64::from).sum::<f64>();
        let noise = pseudo_noise(t.timestamp() as f64 / 60.0 + seed);
        let offset = if device == "refiner-2" { 0.015 } else { 0.0 };
        let gap = self.gap(t, offset, noise, actions);

        match param {
            "gap" => gap,
            "freeness" => 450.0 + (0.35 - gap) * 900.0 + noise * 6.0,
            "fiber_length" => 2.2 - (0.35 - gap) * 4.0 + noise * 0.02,
            _ => 100.0 + noise * 10.0,
        }
    }
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic noise in [-1, 1]
fn pseudo_noise(x: f64) -> f64 {
    ((x * 12.9898).sin() * 43_758.545_3).fract().abs() * 2.0 - 1.0
}

#[async_trait]
impl SampleFetcher for DemoSource {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError> {
        tokio::time::sleep(self.latency).await;

        let step = request.interval_ms.max(1_000) as i64;
        let start_ms = request.range.start.timestamp_millis();
        let end_ms = request.range.end.timestamp_millis();
        let first = (start_ms + step - 1).div_euclid(step) * step;

        let device = request.key.device_id.as_str();
        let actions: Vec<LogEntry> = self
            .actions(&request.range)
            .into_iter()
            .filter(|entry| entry.device_id == device)
            .collect();

        let mut samples = Vec::new();
        let mut ms = first;
        while ms <= end_ms {
            if let Some(t) = Utc.timestamp_millis_opt(ms).single() {
                // sensor dropout once every ~8 hours
                let value = if (ms / step).rem_euclid(487) == 0 {
                    f64::NAN
                } else {
                    self.value(&request.key.param_id, device, t, &actions)
                };
                samples.push(Sample::new(t, value));
            }
            ms += step;
        }

        tracing::debug!(series = %request.key, samples = samples.len(), "demo series generated");
        Ok(samples)
    }
}

#[async_trait]
impl LogFetcher for DemoSource {
    async fn fetch_logs(&self, range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        tokio::time::sleep(self.latency).await;
        Ok(self.actions(range))
    }
}
