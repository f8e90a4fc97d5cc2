//! Analysis session: the panes of one view and the components they share

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use rt_core::events::events::{
    CorrelationConflict, FetchFailed, HoverChanged, LogSelected, RangeChanged, SampleDropped,
    SeriesReplaced, StaleResultDiscarded,
};
use rt_core::{
    CoreError, EventBus, HoverSubscriber, LogEntry, LogId, RangeSubscriber, SeriesKey, SyncBus,
    TimeWindow, Viewport,
};
use rt_data::{
    CorrelationIndex, FetchError, LoadReport, LogFetcher, ReplaceOutcome, SampleFetcher,
    SeriesStore, SessionConfig, SessionLoader,
};
use tracing::{debug, info, warn};

use crate::pane::{Pane, PaneFrame, PaneId};
use crate::{Correlations, ViewContext};

/// Forwards window and hover changes to the event bus
struct EventBridge {
    events: Arc<EventBus>,
}

impl RangeSubscriber for EventBridge {
    fn on_range_changed(&self, viewport: Viewport) {
        self.events.publish(RangeChanged {
            start: viewport.start(),
            end: viewport.end(),
        });
    }
}

impl HoverSubscriber for EventBridge {
    fn on_hover(&self, index: Option<usize>) {
        self.events.publish(HoverChanged { index });
    }
}

/// Owns the time window, hover bus, store and panes of one analysis view.
///
/// Created and dropped by the host; nothing here is process-wide. Event
/// handlers registered on [`AnalysisSession::events`] run synchronously and
/// must not call back into the session.
pub struct AnalysisSession {
    config: SessionConfig,
    window: Arc<TimeWindow>,
    bus: Arc<SyncBus>,
    events: Arc<EventBus>,
    store: Arc<SeriesStore>,
    panes: Vec<Arc<Pane>>,
    logs: RwLock<Arc<Vec<LogEntry>>>,
    correlations: RwLock<Arc<Correlations>>,
    selected_log: RwLock<Option<LogId>>,
    /// Dropped samples already reported for the current store version
    reported: Mutex<AHashSet<(SeriesKey, usize)>>,
    _bridge: Arc<EventBridge>,
}

impl AnalysisSession {
    /// Build the panes described by `config`
    pub fn new(config: SessionConfig) -> Result<Self, CoreError> {
        let window = Arc::new(TimeWindow::with_min_gap(config.min_gap_pct)?);
        let bus = SyncBus::for_window(&window);
        let events = Arc::new(EventBus::new());
        let store = Arc::new(SeriesStore::new());

        let bridge = Arc::new(EventBridge {
            events: events.clone(),
        });
        window.add_subscriber(bridge.clone());
        bus.subscribe(bridge.clone());

        let panes = config
            .panes
            .iter()
            .map(|spec| {
                let series = spec
                    .chart
                    .keys()
                    .iter()
                    .filter_map(|key| config.series_spec(key).cloned())
                    .collect();
                Pane::new(
                    spec.clone(),
                    series,
                    config.padding,
                    config.y_margin_ratio,
                    store.clone(),
                    window.clone(),
                    bus.clone(),
                )
            })
            .collect::<Vec<_>>();

        info!(panes = panes.len(), series = config.series.len(), "analysis session created");

        Ok(Self {
            config,
            window,
            bus,
            events,
            store,
            panes,
            logs: RwLock::new(Arc::new(Vec::new())),
            correlations: RwLock::new(Arc::new(Correlations::default())),
            selected_log: RwLock::new(None),
            reported: Mutex::new(AHashSet::new()),
            _bridge: bridge,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn window(&self) -> &Arc<TimeWindow> {
        &self.window
    }

    pub fn bus(&self) -> &Arc<SyncBus> {
        &self.bus
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn store(&self) -> &Arc<SeriesStore> {
        &self.store
    }

    pub fn panes(&self) -> &[Arc<Pane>] {
        &self.panes
    }

    pub fn pane(&self, id: PaneId) -> Option<&Arc<Pane>> {
        self.panes.iter().find(|pane| pane.id() == id)
    }

    /// Loader feeding this session's store from the given collaborators
    pub fn loader(
        &self,
        samples: Arc<dyn SampleFetcher>,
        logs: Arc<dyn LogFetcher>,
    ) -> SessionLoader {
        SessionLoader::new(samples, logs, self.store.clone(), self.config.fetch_timeout())
    }

    /// Publish the outcome of a series load and refresh correlations
    pub fn apply_load_report(&self, report: &LoadReport) {
        for (key, error) in &report.failures {
            self.events.publish(FetchFailed {
                series: Some(key.clone()),
                message: error.to_string(),
                retryable: error.is_retryable(),
            });
        }

        match report.outcome {
            ReplaceOutcome::Applied {
                version,
                series_count,
            } => {
                self.reported.lock().clear();
                self.rebuild_correlations();
                self.events.publish(SeriesReplaced {
                    version,
                    series_count,
                });
            }
            ReplaceOutcome::Stale { version, current } => {
                self.events
                    .publish(StaleResultDiscarded { version, current });
            }
        }
    }

    /// Report a failed operation-log fetch
    pub fn report_log_failure(&self, error: &FetchError) {
        warn!("operation log unavailable: {}", error);
        self.events.publish(FetchFailed {
            series: None,
            message: error.to_string(),
            retryable: error.is_retryable(),
        });
    }

    /// Replace the operation log and rebuild every correlation index
    pub fn apply_logs(&self, mut logs: Vec<LogEntry>) {
        logs.sort_by_key(|entry| (entry.start_time, entry.id));
        *self.logs.write() = Arc::new(logs);
        self.rebuild_correlations();

        let logs = self.logs();
        let selected = *self.selected_log.read();
        if let Some(id) = selected {
            if !logs.iter().any(|entry| entry.id == id) {
                self.select_log(None);
            }
        }
    }

    /// Operation log sorted by start time
    pub fn logs(&self) -> Arc<Vec<LogEntry>> {
        self.logs.read().clone()
    }

    pub fn correlations(&self) -> Arc<Correlations> {
        self.correlations.read().clone()
    }

    pub fn selected_log(&self) -> Option<LogId> {
        *self.selected_log.read()
    }

    /// Select a log entry from the linked log list, or clear the selection
    pub fn select_log(&self, id: Option<LogId>) {
        {
            let mut selected = self.selected_log.write();
            if *selected == id {
                return;
            }
            *selected = id;
        }
        debug!(?id, "log selection changed");
        self.events.publish(LogSelected { id });
    }

    /// Log entry linked to the shared hover index, if any
    pub fn hovered_log(&self) -> Option<LogEntry> {
        let index = self.bus.hover().index?;
        let correlations = self.correlations();
        self.config
            .series
            .iter()
            .filter_map(|spec| correlations.get(&spec.key))
            .find_map(|correlation| correlation.log_for_sample(index))
            .cloned()
    }

    /// Sample range of a log entry in the first series that links it
    pub fn sample_range_for_log(&self, id: LogId) -> Option<(SeriesKey, std::ops::RangeInclusive<usize>)> {
        let correlations = self.correlations();
        self.config.series.iter().find_map(|spec| {
            correlations
                .get(&spec.key)
                .and_then(|correlation| correlation.sample_range_for_log(id))
                .map(|range| (spec.key.clone(), range))
        })
    }

    /// Render every pane, reporting newly dropped samples
    pub fn render(&self) -> Vec<(PaneId, PaneFrame)> {
        let ctx = ViewContext {
            correlations: self.correlations(),
            selected_log: self.selected_log(),
        };

        self.panes
            .iter()
            .map(|pane| {
                let frame = pane.render(&ctx);
                self.report_dropped(&frame);
                (pane.id(), frame)
            })
            .collect()
    }

    fn report_dropped(&self, frame: &PaneFrame) {
        for error in &frame.errors {
            let first_seen = self
                .reported
                .lock()
                .insert((error.series_key.clone(), error.index));
            if first_seen {
                warn!("{}", error);
                self.events.publish(SampleDropped {
                    error: error.clone(),
                });
            }
        }
    }

    fn rebuild_correlations(&self) {
        let snapshot = self.store.snapshot();
        let logs = self.logs();

        let mut correlations = AHashMap::with_capacity(snapshot.len());
        for series in snapshot.iter() {
            let index = CorrelationIndex::build(series, &logs);
            for error in index.errors() {
                warn!("{}", error);
                self.events.publish(CorrelationConflict {
                    error: error.clone(),
                });
            }
            correlations.insert(series.key().clone(), index);
        }

        debug!(series = correlations.len(), logs = logs.len(), "correlation indices rebuilt");
        *self.correlations.write() = Arc::new(correlations);
    }
}
