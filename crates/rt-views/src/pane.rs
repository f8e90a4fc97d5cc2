//! A single chart pane bound to the shared time window and hover bus

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rt_core::{
    ActionType, DataError, HoverSubscriber, LogId, Rgba, Series, SyncBus, TimeWindow, Viewport,
};
use rt_data::{
    visible_slice, y_domain, ChartSpec, Padding, PaneSpec, SeriesSpec, SeriesStore,
    StoreSnapshot, VisibleSlice, YDomain,
};
use rt_render::{
    AxisRenderer, Chart, CoordinateMapper, CurveRenderer, DrawCommand, DrawList, PlotFrame, Point,
    SeriesData, Stroke, TextAnchor,
};
use uuid::Uuid;

use crate::{palette, ViewContext};

/// Unique identifier for a pane
pub type PaneId = Uuid;

/// Hover state machine of a pane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaneState {
    #[default]
    Idle,
    /// Absolute sample index published on the bus
    Hovering { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneStatus {
    Ready,
    /// Nothing to plot: series missing, failed or too short
    NoData,
}

/// One value of the hover read-out
#[derive(Debug, Clone, PartialEq)]
pub struct ReadoutValue {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub color: Rgba,
}

/// Values under the shared hover index
#[derive(Debug, Clone, PartialEq)]
pub struct HoverReadout {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<ReadoutValue>,
}

/// Result of rendering a pane
#[derive(Debug, Clone)]
pub struct PaneFrame {
    pub draw_list: DrawList,
    pub status: PaneStatus,
    /// Samples skipped because they are not finite
    pub errors: Vec<DataError>,
    pub readout: Option<HoverReadout>,
    /// Log entry linked to the hovered sample
    pub hovered_log: Option<LogId>,
}

struct Visible<'a> {
    spec: &'a SeriesSpec,
    series: &'a Series,
    slice: VisibleSlice<'a>,
}

/// A chart pane
///
/// Panes share the session's store, time window and hover bus. Pointer input
/// is translated to an absolute sample index and published on the bus; every
/// pane, the publisher included, receives it through [`HoverSubscriber`].
pub struct Pane {
    id: PaneId,
    spec: PaneSpec,
    series: Vec<SeriesSpec>,
    padding: Padding,
    y_margin_ratio: f64,
    size: RwLock<(f32, f32)>,
    state: RwLock<PaneState>,
    store: Arc<SeriesStore>,
    window: Arc<TimeWindow>,
    bus: Arc<SyncBus>,
    curves: CurveRenderer,
    axis: AxisRenderer,
}

impl Pane {
    /// Create a pane and subscribe it to `bus`
    pub fn new(
        spec: PaneSpec,
        series: Vec<SeriesSpec>,
        padding: Padding,
        y_margin_ratio: f64,
        store: Arc<SeriesStore>,
        window: Arc<TimeWindow>,
        bus: Arc<SyncBus>,
    ) -> Arc<Self> {
        let pane = Arc::new(Self {
            id: Uuid::new_v4(),
            spec,
            series,
            padding,
            y_margin_ratio,
            size: RwLock::new((640.0, 220.0)),
            state: RwLock::new(PaneState::Idle),
            store,
            window,
            bus: bus.clone(),
            curves: CurveRenderer::default(),
            axis: AxisRenderer::default(),
        });
        bus.subscribe(pane.clone());
        pane
    }

    pub fn id(&self) -> PaneId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn chart(&self) -> &ChartSpec {
        &self.spec.chart
    }

    pub fn state(&self) -> PaneState {
        *self.state.read()
    }

    pub fn size(&self) -> (f32, f32) {
        *self.size.read()
    }

    /// Set the canvas size in pixels
    pub fn set_size(&self, width: f32, height: f32) {
        *self.size.write() = (width.max(0.0), height.max(0.0));
    }

    /// Publish the sample nearest to the pointer at `px` (canvas x)
    pub fn pointer_move(&self, px: f32) -> Option<usize> {
        let snapshot = self.store.snapshot();
        let visible = self.visible(&snapshot, self.window.viewport());
        let index = visible.first().and_then(|primary| {
            let mapper = self.mapper(&primary.slice, YDomain { min: 0.0, max: 1.0 });
            mapper
                .nearest_index(px)
                .map(|local| primary.slice.absolute_index(local))
        });

        match index {
            Some(_) => self.bus.publish(index),
            None => self.bus.clear(),
        }
        index
    }

    /// The pointer left the pane
    pub fn pointer_leave(&self) {
        self.bus.publish(None);
    }

    /// Build the draw list for the current window, hover and selection
    pub fn render(&self, ctx: &ViewContext) -> PaneFrame {
        let snapshot = self.store.snapshot();
        let visible = self.visible(&snapshot, self.window.viewport());
        let single = matches!(self.spec.chart, ChartSpec::Single(_));

        let domain = y_domain(
            visible.iter().map(|v| {
                let threshold = if single { v.series.threshold } else { None };
                (v.slice.samples(), threshold)
            }),
            self.y_margin_ratio,
        );
        let (Some(primary), Some(domain)) = (visible.first(), domain) else {
            return self.placeholder();
        };

        let data: Vec<SeriesData<'_>> = visible
            .iter()
            .map(|v| SeriesData {
                key: v.series.key(),
                label: &v.spec.label,
                samples: v.slice.samples(),
                index_offset: v.slice.start_idx(),
                color: v.series.color,
                threshold: v.series.threshold,
            })
            .collect();
        let chart = match self.spec.chart {
            ChartSpec::Single(_) => match data.first() {
                Some(series) => Chart::Single(*series),
                None => return self.placeholder(),
            },
            ChartSpec::Multi(_) => Chart::Multi(data),
        };

        let frame = self.frame(domain);
        let mapper = frame.mapper(primary.slice.len());
        let hovered = match self.state() {
            PaneState::Hovering { index } => Some(index),
            PaneState::Idle => None,
        };
        let correlation = ctx.correlations.get(primary.series.key());
        let hovered_log = hovered
            .and_then(|index| correlation.and_then(|c| c.log_for_sample(index)))
            .map(|entry| entry.id);

        let mut list = self.axis.render(&frame, primary.slice.samples());

        if let Some(correlation) = correlation {
            let (top_left, bottom_right) = mapper.plot_rect();
            for link in correlation.links_in(primary.slice.range()) {
                let lo = primary.slice.local_index(link.lo.max(primary.slice.start_idx()));
                let hi = primary.slice.local_index(link.hi.min(primary.slice.end_idx()));
                let (Some(lo), Some(hi)) = (lo, hi) else {
                    continue;
                };
                let base = match correlation.entry(link.log_id).map(|e| e.action) {
                    Some(ActionType::Retract) => palette::RETRACT,
                    _ => palette::ADVANCE,
                };
                let emphasis = if ctx.selected_log == Some(link.log_id) {
                    0.4
                } else if hovered_log == Some(link.log_id) {
                    0.25
                } else {
                    0.08
                };
                let (x0, x1) = (mapper.x(lo), mapper.x(hi));
                list.push(DrawCommand::Rect {
                    min: Point::new(x0.min(x1 - 2.0), top_left.y),
                    max: Point::new(x1.max(x0 + 2.0), bottom_right.y),
                    fill: Some(base.fade(emphasis)),
                    stroke: None,
                });
            }
        }

        let curves = self.curves.render(&chart, &frame);
        list.extend(curves.draw_list);

        let readout = hovered.and_then(|index| self.push_hover(&mut list, &visible, &frame, index));

        let (width, _) = self.size();
        list.push(DrawCommand::Text {
            position: Point::new(width - self.padding.right, self.padding.top / 2.0),
            text: self.spec.title.clone(),
            color: palette::TEXT,
            size: 12.0,
            anchor: TextAnchor::End,
        });

        PaneFrame {
            draw_list: list,
            status: PaneStatus::Ready,
            errors: curves.errors,
            readout,
            hovered_log,
        }
    }

    fn push_hover(
        &self,
        list: &mut DrawList,
        visible: &[Visible<'_>],
        frame: &PlotFrame,
        index: usize,
    ) -> Option<HoverReadout> {
        let primary = visible.first()?;
        let local = primary.slice.local_index(index)?;
        let mapper = frame.mapper(primary.slice.len());
        let (top_left, bottom_right) = mapper.plot_rect();
        let x = mapper.x(local);

        list.push(DrawCommand::Line {
            from: Point::new(x, top_left.y),
            to: Point::new(x, bottom_right.y),
            stroke: Stroke::solid(1.0, palette::CROSSHAIR.with_alpha(140)),
        });

        let mut values = Vec::new();
        for v in visible {
            let Some(local) = v.slice.local_index(index) else {
                continue;
            };
            let sample = v.slice.samples()[local];
            if !sample.value.is_finite() {
                continue;
            }
            let series_mapper = frame.mapper(v.slice.len());
            list.push(DrawCommand::Marker {
                center: series_mapper.point(local, sample.value),
                radius: 4.0,
                fill: v.series.color,
                stroke: Some(Stroke::solid(1.5, Rgba::WHITE)),
            });
            values.push(ReadoutValue {
                label: v.spec.label.clone(),
                value: sample.value,
                unit: v.series.unit.clone(),
                color: v.series.color,
            });
        }

        let timestamp = primary.slice.samples()[local].timestamp;
        let mut text = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        for value in &values {
            text.push_str(&format!("   {} {:.3} {}", value.label, value.value, value.unit));
        }
        list.push(DrawCommand::Text {
            position: Point::new(top_left.x + 6.0, top_left.y + 10.0),
            text,
            color: palette::TEXT,
            size: 11.0,
            anchor: TextAnchor::Start,
        });

        Some(HoverReadout {
            index,
            timestamp,
            values,
        })
    }

    fn placeholder(&self) -> PaneFrame {
        let (width, height) = self.size();
        let mut list = DrawList::new();
        list.push(DrawCommand::Text {
            position: Point::new(width / 2.0, height / 2.0),
            text: "No data".to_string(),
            color: palette::MUTED_TEXT,
            size: 14.0,
            anchor: TextAnchor::Middle,
        });
        list.push(DrawCommand::Text {
            position: Point::new(width - self.padding.right, self.padding.top / 2.0),
            text: self.spec.title.clone(),
            color: palette::TEXT,
            size: 12.0,
            anchor: TextAnchor::End,
        });

        PaneFrame {
            draw_list: list,
            status: PaneStatus::NoData,
            errors: Vec::new(),
            readout: None,
            hovered_log: None,
        }
    }

    fn frame(&self, domain: YDomain) -> PlotFrame {
        let (width, height) = self.size();
        PlotFrame::new(width, height, self.padding, domain)
    }

    fn mapper(&self, slice: &VisibleSlice<'_>, domain: YDomain) -> CoordinateMapper {
        self.frame(domain).mapper(slice.len())
    }

    fn visible<'a>(&'a self, snapshot: &'a StoreSnapshot, viewport: Viewport) -> Vec<Visible<'a>> {
        self.series
            .iter()
            .filter_map(|spec| {
                let series = snapshot.get(&spec.key)?;
                match visible_slice(series, viewport) {
                    Ok(slice) => Some(Visible {
                        spec,
                        series: series.as_ref(),
                        slice,
                    }),
                    Err(e) => {
                        tracing::debug!(series = %spec.key, "{}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

impl HoverSubscriber for Pane {
    fn on_hover(&self, index: Option<usize>) {
        *self.state.write() = match index {
            Some(index) => PaneState::Hovering { index },
            None => PaneState::Idle,
        };
    }
}
