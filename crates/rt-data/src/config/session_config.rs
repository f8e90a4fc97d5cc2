//! Session configuration: series, pane layout and data source

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rt_core::{CoreError, Padding, Rgba, Sample, Series, SeriesKey, Threshold, TimeRange, DEFAULT_MIN_GAP_PCT};
use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;
use crate::store::DEFAULT_Y_MARGIN_RATIO;
use crate::SourceError;

/// Display metadata for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub key: SeriesKey,
    pub label: String,
    pub unit: String,
    pub color: Rgba,
    #[serde(default)]
    pub threshold: Option<Threshold>,
}

impl SeriesSpec {
    /// Wrap fetched samples into a series carrying this metadata
    pub fn build_series(&self, samples: Vec<Sample>) -> Result<Series, CoreError> {
        Ok(Series::new(self.key.clone(), samples)?
            .with_unit(self.unit.clone())
            .with_color(self.color)
            .with_threshold(self.threshold))
    }
}

/// What a pane plots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "series", rename_all = "snake_case")]
pub enum ChartSpec {
    Single(SeriesKey),
    Multi(Vec<SeriesKey>),
}

impl ChartSpec {
    pub fn keys(&self) -> &[SeriesKey] {
        match self {
            ChartSpec::Single(key) => std::slice::from_ref(key),
            ChartSpec::Multi(keys) => keys,
        }
    }
}

/// One chart pane of the session layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSpec {
    pub title: String,
    pub chart: ChartSpec,
}

/// Where the session data comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Synthetic data generated by the host
    Demo,
    /// One CSV file per series plus an optional JSON log file
    Files {
        samples_dir: PathBuf,
        #[serde(default)]
        logs_file: Option<PathBuf>,
        #[serde(default)]
        nulls: NullConfig,
    },
}

/// Complete configuration of an analysis session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum window width in percent of the axis
    pub min_gap_pct: f64,

    /// Share of the value range added above and below the curves
    pub y_margin_ratio: f64,

    /// Requested spacing between samples
    pub interval_ms: u64,

    /// Per-request timeout for the fetch collaborators
    pub fetch_timeout_ms: u64,

    /// Hours of history to load when no explicit range is set
    pub lookback_hours: u32,

    /// Explicit time range to load
    pub time_range: Option<TimeRange>,

    pub padding: Padding,

    pub series: Vec<SeriesSpec>,

    pub panes: Vec<PaneSpec>,

    pub source: SourceConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let gap_1 = SeriesKey::new("refiner-1", "gap");
        let gap_2 = SeriesKey::new("refiner-2", "gap");
        let freeness = SeriesKey::new("refiner-1", "freeness");
        let fiber_length = SeriesKey::new("refiner-1", "fiber_length");

        Self {
            min_gap_pct: DEFAULT_MIN_GAP_PCT,
            y_margin_ratio: DEFAULT_Y_MARGIN_RATIO,
            interval_ms: 60_000,
            fetch_timeout_ms: 10_000,
            lookback_hours: 24,
            time_range: None,
            padding: Padding::default(),
            series: vec![
                SeriesSpec {
                    key: gap_1.clone(),
                    label: "Refining gap".to_string(),
                    unit: "mm".to_string(),
                    color: Rgba::from_rgb(100, 150, 250),
                    threshold: Some(Threshold::new(0.35, 0.05)),
                },
                SeriesSpec {
                    key: freeness.clone(),
                    label: "Freeness".to_string(),
                    unit: "ml CSF".to_string(),
                    color: Rgba::from_rgb(250, 150, 100),
                    threshold: Some(Threshold::new(450.0, 30.0)),
                },
                SeriesSpec {
                    key: fiber_length.clone(),
                    label: "Fiber length".to_string(),
                    unit: "mm".to_string(),
                    color: Rgba::from_rgb(150, 250, 100),
                    threshold: None,
                },
                SeriesSpec {
                    key: gap_2.clone(),
                    label: "Refining gap (line 2)".to_string(),
                    unit: "mm".to_string(),
                    color: Rgba::from_rgb(250, 100, 150),
                    threshold: None,
                },
            ],
            panes: vec![
                PaneSpec {
                    title: "Refining gap".to_string(),
                    chart: ChartSpec::Single(gap_1.clone()),
                },
                PaneSpec {
                    title: "Freeness".to_string(),
                    chart: ChartSpec::Single(freeness),
                },
                PaneSpec {
                    title: "Fiber length".to_string(),
                    chart: ChartSpec::Single(fiber_length),
                },
                PaneSpec {
                    title: "Gap comparison".to_string(),
                    chart: ChartSpec::Multi(vec![gap_1, gap_2]),
                },
            ],
            source: SourceConfig::Demo,
        }
    }
}

impl SessionConfig {
    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::info!(path = %path.display(), panes = config.panes.len(), "configuration loaded");
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SourceError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check value ranges and pane references
    pub fn validate(&self) -> Result<(), SourceError> {
        if !(self.min_gap_pct > 0.0 && self.min_gap_pct <= 100.0) {
            return Err(SourceError::Config(format!(
                "min_gap_pct must lie in (0, 100], got {}",
                self.min_gap_pct
            )));
        }
        if !(self.y_margin_ratio.is_finite() && self.y_margin_ratio >= 0.0) {
            return Err(SourceError::Config(format!(
                "y_margin_ratio must be a non-negative number, got {}",
                self.y_margin_ratio
            )));
        }
        if self.interval_ms == 0 || self.fetch_timeout_ms == 0 {
            return Err(SourceError::Config(
                "interval_ms and fetch_timeout_ms must be positive".to_string(),
            ));
        }

        let mut known = HashSet::new();
        for spec in &self.series {
            if !known.insert(&spec.key) {
                return Err(SourceError::Config(format!("series {} configured twice", spec.key)));
            }
        }

        for pane in &self.panes {
            if pane.chart.keys().is_empty() {
                return Err(SourceError::Config(format!("pane '{}' has no series", pane.title)));
            }
            if let Some(missing) = pane.chart.keys().iter().find(|key| !known.contains(key)) {
                return Err(SourceError::Config(format!(
                    "pane '{}' references unknown series {}",
                    pane.title, missing
                )));
            }
        }
        Ok(())
    }

    pub fn series_spec(&self, key: &SeriesKey) -> Option<&SeriesSpec> {
        self.series.iter().find(|spec| &spec.key == key)
    }

    /// Time range to load, relative to `now` unless set explicitly
    pub fn resolve_range(&self, now: DateTime<Utc>) -> TimeRange {
        self.time_range
            .unwrap_or_else(|| TimeRange::new(now - Duration::hours(i64::from(self.lookback_hours)), now))
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fetch_timeout_ms)
    }
}
