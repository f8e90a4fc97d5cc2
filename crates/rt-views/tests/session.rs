use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rt_core::events::events::{
    CorrelationConflict, FetchFailed, HoverChanged, LogSelected, SampleDropped, StaleResultDiscarded,
};
use rt_core::events::{downcast, handler_from_fn, Event};
use rt_core::{ActionType, LogEntry, LogId, LogSource, Rgba, Sample, SeriesKey, TimeRange};
use rt_data::{
    ChartSpec, FetchError, LogFetcher, PaneSpec, SampleFetcher, SeriesRequest, SeriesSpec,
    SessionConfig,
};
use rt_views::{AnalysisSession, PaneState, PaneStatus};

fn minute(m: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + chrono::Duration::minutes(m)
}

fn gap() -> SeriesKey {
    SeriesKey::new("refiner-1", "gap")
}

fn freeness() -> SeriesKey {
    SeriesKey::new("refiner-1", "freeness")
}

fn series_spec(key: SeriesKey) -> SeriesSpec {
    SeriesSpec {
        label: key.param_id.clone(),
        key,
        unit: String::new(),
        color: Rgba::default(),
        threshold: None,
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        time_range: Some(TimeRange::new(minute(0), minute(10))),
        series: vec![series_spec(gap()), series_spec(freeness())],
        panes: vec![
            PaneSpec {
                title: "Gap".to_string(),
                chart: ChartSpec::Single(gap()),
            },
            PaneSpec {
                title: "Freeness".to_string(),
                chart: ChartSpec::Single(freeness()),
            },
        ],
        ..SessionConfig::default()
    }
}

fn log(id: u64, from: i64, to: i64) -> LogEntry {
    LogEntry {
        id: LogId(id),
        start_time: minute(from),
        end_time: minute(to),
        device_id: "refiner-1".to_string(),
        action: ActionType::Advance,
        value_delta: 0.01,
        duration_seconds: ((to - from) * 60) as f64,
        source: LogSource::Manual,
    }
}

/// Eleven samples per series, one per minute; `freeness` optionally fails
struct Plant {
    delay: Duration,
    freeness_down: bool,
}

#[async_trait]
impl SampleFetcher for Plant {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError> {
        tokio::time::sleep(self.delay).await;
        if self.freeness_down && request.key == freeness() {
            return Err(FetchError::Network("gateway unreachable".to_string()));
        }
        Ok((0..=10).map(|m| Sample::new(minute(m), m as f64)).collect())
    }
}

#[async_trait]
impl LogFetcher for Plant {
    async fn fetch_logs(&self, _range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        Ok(vec![log(1, 2, 4), log(2, 3, 6), log(3, 7, 8)])
    }
}

/// Like [`Plant`], but the gap sensor reads NaN at minute 4
struct Dropout;

#[async_trait]
impl SampleFetcher for Dropout {
    async fn fetch_series(&self, request: &SeriesRequest) -> Result<Vec<Sample>, FetchError> {
        Ok((0..=10)
            .map(|m| {
                let value = if request.key == gap() && m == 4 {
                    f64::NAN
                } else {
                    m as f64
                };
                Sample::new(minute(m), value)
            })
            .collect())
    }
}

#[async_trait]
impl LogFetcher for Dropout {
    async fn fetch_logs(&self, _range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        Ok(Vec::new())
    }
}

fn record<E: Event + Clone>(session: &AnalysisSession) -> Arc<Mutex<Vec<E>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    session
        .events()
        .subscribe::<E>(handler_from_fn(move |event| {
            if let Some(event) = downcast::<E>(event) {
                sink.lock().push(event.clone());
            }
        }));
    seen
}

async fn loaded_session(plant: Plant) -> AnalysisSession {
    let session = AnalysisSession::new(config()).unwrap();
    let plant = Arc::new(plant);
    let loader = session.loader(plant.clone(), plant);
    let range = session.config().resolve_range(Utc::now());

    let report = loader
        .load_series(&session.config().series, range, session.config().interval_ms)
        .await;
    session.apply_load_report(&report);
    match loader.load_logs(range).await {
        Ok(logs) => session.apply_logs(logs),
        Err(error) => session.report_log_failure(&error),
    }
    for pane in session.panes() {
        pane.set_size(472.0, 248.0);
    }
    session
}

#[tokio::test]
async fn test_hover_is_shared_across_panes() {
    let session = loaded_session(Plant {
        delay: Duration::ZERO,
        freeness_down: false,
    })
    .await;
    let hovers = record::<HoverChanged>(&session);

    // plot spans x 56..456 over samples 0..=10
    let index = session.panes()[0].pointer_move(56.0 + 120.0);
    assert_eq!(index, Some(3));
    for pane in session.panes() {
        assert_eq!(pane.state(), PaneState::Hovering { index: 3 });
    }
    assert_eq!(session.hovered_log().map(|entry| entry.id), Some(LogId(1)));

    let frames = session.render();
    assert!(frames.iter().all(|(_, frame)| frame.hovered_log == Some(LogId(1))));

    session.panes()[1].pointer_leave();
    assert!(session.panes().iter().all(|pane| pane.state() == PaneState::Idle));
    assert_eq!(
        *hovers.lock(),
        vec![HoverChanged { index: Some(3) }, HoverChanged { index: None }]
    );
}

#[tokio::test]
async fn test_zoom_clears_hover_and_rebases_index() {
    let session = loaded_session(Plant {
        delay: Duration::ZERO,
        freeness_down: false,
    })
    .await;

    session.panes()[0].pointer_move(300.0);
    session.window().set_range(50.0, 100.0).unwrap();
    assert_eq!(session.bus().hover().index, None);

    // samples 5..=10 are visible; the left edge is absolute index 5
    assert_eq!(session.panes()[1].pointer_move(56.0), Some(5));
}

#[tokio::test]
async fn test_overlapping_logs_are_reported() {
    let session = AnalysisSession::new(config()).unwrap();
    let conflicts = record::<CorrelationConflict>(&session);

    let plant = Arc::new(Plant {
        delay: Duration::ZERO,
        freeness_down: false,
    });
    let loader = session.loader(plant.clone(), plant);
    let range = TimeRange::new(minute(0), minute(10));
    let report = loader.load_series(&session.config().series, range, 60_000).await;
    session.apply_load_report(&report);
    session.apply_logs(loader.load_logs(range).await.unwrap());

    let conflicts = conflicts.lock();
    assert_eq!(conflicts.len(), 2, "one conflict per series");
    assert_eq!(conflicts[0].error.conflicting_ids, vec![LogId(1), LogId(2)]);

    let correlations = session.correlations();
    let index = correlations.get(&gap()).unwrap();
    assert_eq!(index.sample_range_for_log(LogId(1)), Some(2..=4));
    assert_eq!(index.sample_range_for_log(LogId(2)), None);
    assert_eq!(index.log_for_sample(7).map(|e| e.id), Some(LogId(3)));
}

#[tokio::test]
async fn test_log_selection_is_published_once() {
    let session = loaded_session(Plant {
        delay: Duration::ZERO,
        freeness_down: false,
    })
    .await;
    let selections = record::<LogSelected>(&session);

    session.select_log(Some(LogId(3)));
    session.select_log(Some(LogId(3)));
    assert_eq!(session.selected_log(), Some(LogId(3)));
    assert_eq!(session.sample_range_for_log(LogId(3)), Some((gap(), 7..=8)));

    session.apply_logs(vec![log(1, 2, 4)]);
    assert_eq!(session.selected_log(), None);
    assert_eq!(
        *selections.lock(),
        vec![LogSelected { id: Some(LogId(3)) }, LogSelected { id: None }]
    );
}

#[tokio::test]
async fn test_failed_series_shows_no_data() {
    let session = AnalysisSession::new(config()).unwrap();
    let failures = record::<FetchFailed>(&session);
    let plant = Arc::new(Plant {
        delay: Duration::ZERO,
        freeness_down: true,
    });
    let loader = session.loader(plant.clone(), plant);
    let report = loader
        .load_series(&session.config().series, TimeRange::new(minute(0), minute(10)), 60_000)
        .await;
    session.apply_load_report(&report);

    let failures = failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].series, Some(freeness()));
    assert!(failures[0].retryable);

    let frames = session.render();
    assert_eq!(frames[0].1.status, PaneStatus::Ready);
    assert_eq!(frames[1].1.status, PaneStatus::NoData);
}

#[tokio::test]
async fn test_superseded_load_is_discarded() {
    let session = AnalysisSession::new(config()).unwrap();
    let stale = record::<StaleResultDiscarded>(&session);
    let range = TimeRange::new(minute(0), minute(10));

    let slow = Arc::new(Plant {
        delay: Duration::from_millis(200),
        freeness_down: false,
    });
    let fast = Arc::new(Plant {
        delay: Duration::ZERO,
        freeness_down: true,
    });
    let slow_loader = session.loader(slow.clone(), slow);
    let fast_loader = session.loader(fast.clone(), fast);
    let specs = session.config().series.clone();

    let first = slow_loader.load_series(&specs, range, 60_000);
    let second = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        fast_loader.load_series(&specs, range, 60_000).await
    };
    let (first, second) = tokio::join!(first, second);
    session.apply_load_report(&first);
    session.apply_load_report(&second);

    assert!(!first.is_applied());
    assert!(second.is_applied());
    assert_eq!(stale.lock().len(), 1);
    assert_eq!(session.store().snapshot().len(), 1);
}

#[tokio::test]
async fn test_dropped_sample_reported_once_per_load() {
    let session = AnalysisSession::new(config()).unwrap();
    let dropped = record::<SampleDropped>(&session);
    let source = Arc::new(Dropout);
    let loader = session.loader(source.clone(), source);
    let range = TimeRange::new(minute(0), minute(10));

    let report = loader.load_series(&session.config().series, range, 60_000).await;
    session.apply_load_report(&report);
    session.render();
    session.render();
    {
        let dropped = dropped.lock();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].error.series_key, gap());
        assert_eq!(dropped[0].error.index, 4);
    }

    // a new accepted snapshot reports it again
    let report = loader.load_series(&session.config().series, range, 60_000).await;
    assert!(report.is_applied());
    session.apply_load_report(&report);
    session.render();
    assert_eq!(dropped.lock().len(), 2);
}
