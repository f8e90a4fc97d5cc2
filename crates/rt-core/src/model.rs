//! Measurement and event model
//!
//! Samples and series are the continuous side of an analysis session, log
//! entries the discrete side. Both are immutable once loaded.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One time-stamped measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Identifies a series by (device, parameter)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub device_id: String,
    pub param_id: String,
}

impl SeriesKey {
    pub fn new(device_id: impl Into<String>, param_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            param_id: param_id.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.param_id)
    }
}

/// RGBA colour, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Rgba = Rgba([255, 255, 255, 255]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba([r, g, b, 255])
    }

    /// Same colour with a replaced alpha channel
    pub const fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, alpha])
    }

    /// Scale the alpha channel by `factor` in [0, 1]
    pub fn fade(self, factor: f32) -> Self {
        let alpha = (self.0[3] as f32 * factor.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(alpha)
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::from_rgb(100, 150, 250)
    }
}

/// Target +/- deviation reference band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub target: f64,
    pub deviation: f64,
}

impl Threshold {
    pub fn new(target: f64, deviation: f64) -> Self {
        Self {
            target,
            deviation: deviation.abs(),
        }
    }

    pub fn lower(&self) -> f64 {
        self.target - self.deviation
    }

    pub fn upper(&self) -> f64 {
        self.target + self.deviation
    }
}

/// An ordered sequence of samples for one (device, parameter) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: SeriesKey,
    samples: Vec<Sample>,
    pub unit: String,
    pub color: Rgba,
    pub threshold: Option<Threshold>,
}

impl Series {
    /// Create a series, rejecting samples that are not strictly ordered
    pub fn new(key: SeriesKey, samples: Vec<Sample>) -> Result<Self, CoreError> {
        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(CoreError::UnorderedSamples {
                key,
                index: index + 1,
            });
        }

        Ok(Self {
            key,
            samples,
            unit: String::new(),
            color: Rgba::default(),
            threshold: None,
        })
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn with_threshold(mut self, threshold: Option<Threshold>) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Covered time span, if any
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some(TimeRange::new(first.timestamp, last.timestamp))
    }
}

/// Inclusive time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range; the bounds are swapped when given in reverse
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Instant at `pct` percent of the range
    pub fn at_percent(&self, pct: f64) -> DateTime<Utc> {
        let total_ms = self.duration().num_milliseconds() as f64;
        let offset = (total_ms * pct.clamp(0.0, 100.0) / 100.0).round() as i64;
        self.start + Duration::milliseconds(offset)
    }
}

/// Identifier of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogId(pub u64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Knife action recorded in the operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Advance,
    Retract,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Advance => f.write_str("advance"),
            ActionType::Retract => f.write_str("retract"),
        }
    }
}

/// Who triggered a logged action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Manual,
    Automatic,
}

/// A discrete operational event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub device_id: String,
    pub action: ActionType,
    pub value_delta: f64,
    pub duration_seconds: f64,
    pub source: LogSource,
}

impl LogEntry {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_series_rejects_duplicate_timestamps() {
        let key = SeriesKey::new("refiner-1", "gap");
        let samples = vec![
            Sample::new(at(0), 1.0),
            Sample::new(at(1), 2.0),
            Sample::new(at(1), 3.0),
        ];

        let err = Series::new(key.clone(), samples).unwrap_err();
        assert_eq!(err, CoreError::UnorderedSamples { key, index: 2 });
    }

    #[test]
    fn test_series_time_range() {
        let series = Series::new(
            SeriesKey::new("refiner-1", "gap"),
            vec![Sample::new(at(0), 1.0), Sample::new(at(60), 2.0)],
        )
        .unwrap();

        let range = series.time_range().unwrap();
        assert_eq!(range.start, at(0));
        assert_eq!(range.at_percent(50.0), at(30));
    }

    #[test]
    fn test_threshold_band() {
        let threshold = Threshold::new(2.0, -0.5);
        assert_eq!(threshold.lower(), 1.5);
        assert_eq!(threshold.upper(), 2.5);
    }

    #[test]
    fn test_log_entry_serde() {
        let entry = LogEntry {
            id: LogId(7),
            start_time: at(0),
            end_time: at(30),
            device_id: "refiner-1".to_string(),
            action: ActionType::Advance,
            value_delta: 0.05,
            duration_seconds: 30.0,
            source: LogSource::Automatic,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"advance\""));
        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
