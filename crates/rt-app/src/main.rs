//! Refiner trend explorer

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chrono::Utc;
use eframe::egui::{self, Context, Sense, Ui};
use rt_core::{LogEntry, TimeRange};
use rt_data::{
    CsvSampleFetcher, FetchError, JsonLogFetcher, LoadReport, LogFetcher, SampleFetcher,
    SessionConfig, SessionLoader, SourceConfig,
};
use rt_views::{AnalysisSession, PaneId};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

mod demo;
mod log_table;
mod painter;
mod range_bar;
mod theme;

use demo::DemoSource;
use painter::EguiRenderer;

/// Smallest pane height before the pane list scrolls
const MIN_PANE_HEIGHT: f32 = 180.0;
/// Zoom factor per scroll wheel notch
const WHEEL_ZOOM: f64 = 0.9;

/// Results delivered by background loads
enum LoadMessage {
    Series(LoadReport),
    Logs(Result<Vec<LogEntry>, FetchError>),
}

/// What the status line shows
enum Status {
    Loading,
    Ready,
    Failed { message: String, retryable: bool },
}

/// Log collaborator for file sources without a log file
struct NoLogs;

#[async_trait]
impl LogFetcher for NoLogs {
    async fn fetch_logs(&self, _range: &TimeRange) -> Result<Vec<LogEntry>, FetchError> {
        Ok(Vec::new())
    }
}

/// Fetch collaborators for the configured source
fn fetchers(config: &SessionConfig) -> (Arc<dyn SampleFetcher>, Arc<dyn LogFetcher>) {
    match &config.source {
        SourceConfig::Demo => {
            let demo = Arc::new(DemoSource::new());
            let samples: Arc<dyn SampleFetcher> = demo.clone();
            let logs: Arc<dyn LogFetcher> = demo;
            (samples, logs)
        }
        SourceConfig::Files {
            samples_dir,
            logs_file,
            nulls,
        } => {
            let samples: Arc<dyn SampleFetcher> =
                Arc::new(CsvSampleFetcher::new(samples_dir.clone(), nulls.clone()));
            let logs: Arc<dyn LogFetcher> = match logs_file {
                Some(path) => Arc::new(JsonLogFetcher::new(path.clone())),
                None => Arc::new(NoLogs),
            };
            (samples, logs)
        }
    }
}

struct TrendApp {
    session: AnalysisSession,
    loader: Arc<SessionLoader>,
    range: TimeRange,
    runtime: tokio::runtime::Runtime,
    tx: mpsc::UnboundedSender<LoadMessage>,
    rx: mpsc::UnboundedReceiver<LoadMessage>,
    pending: usize,
    status: Status,
    hovered_pane: Option<PaneId>,
}

impl TrendApp {
    fn new(
        cc: &eframe::CreationContext<'_>,
        session: AnalysisSession,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        theme::apply_theme(&cc.egui_ctx);

        let (samples, logs) = fetchers(session.config());
        let loader = Arc::new(session.loader(samples, logs));
        let range = session.config().resolve_range(Utc::now());
        let (tx, rx) = mpsc::unbounded_channel();

        let mut app = Self {
            session,
            loader,
            range,
            runtime,
            tx,
            rx,
            pending: 0,
            status: Status::Loading,
            hovered_pane: None,
        };
        app.start_load(&cc.egui_ctx);
        app
    }

    /// Fetch series and logs for the current range in the background
    fn start_load(&mut self, ctx: &Context) {
        info!(start = %self.range.start, end = %self.range.end, "loading session data");
        self.status = Status::Loading;
        self.pending += 2;

        let specs = self.session.config().series.clone();
        let interval_ms = self.session.config().interval_ms;
        let range = self.range;

        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let repaint = ctx.clone();
        self.runtime.spawn(async move {
            let report = loader.load_series(&specs, range, interval_ms).await;
            if tx.send(LoadMessage::Series(report)).is_err() {
                warn!("series load finished after the window closed");
            }
            repaint.request_repaint();
        });

        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let repaint = ctx.clone();
        self.runtime.spawn(async move {
            let logs = loader.load_logs(range).await;
            if tx.send(LoadMessage::Logs(logs)).is_err() {
                warn!("log load finished after the window closed");
            }
            repaint.request_repaint();
        });
    }

    /// Hand finished loads to the session
    fn poll_loads(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match message {
                LoadMessage::Series(report) => {
                    self.session.apply_load_report(&report);
                    if let Some((key, failure)) = report.failures.first() {
                        self.status = Status::Failed {
                            message: format!("{}: {}", key, failure),
                            retryable: report.is_retryable(),
                        };
                    }
                }
                LoadMessage::Logs(Ok(logs)) => self.session.apply_logs(logs),
                LoadMessage::Logs(Err(failure)) => {
                    self.session.report_log_failure(&failure);
                    self.status = Status::Failed {
                        message: format!("operation log: {}", failure),
                        retryable: failure.is_retryable(),
                    };
                }
            }
            if self.pending == 0 && matches!(self.status, Status::Loading) {
                self.status = Status::Ready;
            }
        }
    }

    fn status_line(&mut self, ui: &mut Ui) {
        let mut retry = false;
        ui.horizontal(|ui| {
            match &self.status {
                Status::Loading => {
                    ui.spinner();
                    ui.label("Loading…");
                }
                Status::Ready => {
                    let snapshot = self.session.store().snapshot();
                    ui.label(format!(
                        "{} series, {} log entries",
                        snapshot.len(),
                        self.session.logs().len()
                    ));
                }
                Status::Failed { message, retryable } => {
                    let color = if *retryable {
                        theme::warning()
                    } else {
                        theme::error()
                    };
                    ui.colored_label(color, message);
                    if *retryable && ui.button("Retry").clicked() {
                        retry = true;
                    }
                }
            }
            if let Some(id) = self.session.selected_log() {
                ui.separator();
                ui.label(format!("Selected {}", id));
                if ui.small_button("Clear").clicked() {
                    self.session.select_log(None);
                }
            }
        });
        if retry {
            let ctx = ui.ctx().clone();
            self.start_load(&ctx);
        }
    }

    fn handle_keys(&self, ctx: &Context) {
        let window = self.session.window();
        ctx.input(|i| {
            let viewport = window.viewport();
            let center = (viewport.start() + viewport.end()) / 2.0;
            if i.key_pressed(egui::Key::ArrowLeft) {
                window.pan_by(-viewport.width() * 0.1);
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                window.pan_by(viewport.width() * 0.1);
            }
            if i.key_pressed(egui::Key::Minus) {
                window.zoom(1.0 / WHEEL_ZOOM, center);
            }
            if i.key_pressed(egui::Key::PlusEquals) {
                window.zoom(WHEEL_ZOOM, center);
            }
            if i.key_pressed(egui::Key::Escape) {
                window.reset();
            }
        });
    }

    /// Lay out the panes, forward pointer input, then paint one frame
    fn show_panes(&mut self, ui: &mut Ui) {
        let panes = self.session.panes().to_vec();
        if panes.is_empty() {
            ui.label("No panes configured");
            return;
        }

        let spacing = ui.spacing().item_spacing.y;
        let height = ((ui.available_height() - spacing * (panes.len() as f32 - 1.0))
            / panes.len() as f32)
            .max(MIN_PANE_HEIGHT);
        let padding = self.session.config().padding;

        let mut canvases = Vec::with_capacity(panes.len());
        let mut hovered = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            for pane in &panes {
                let size = egui::vec2(ui.available_width(), height);
                let (response, painter) = ui.allocate_painter(size, Sense::click());
                let rect = response.rect;
                pane.set_size(rect.width(), rect.height());

                if let Some(pos) = response.hover_pos() {
                    let px = pos.x - rect.left();
                    pane.pointer_move(px);
                    hovered = Some(pane.id());

                    let scroll = ui.input(|i| i.scroll_delta.y);
                    if scroll != 0.0 {
                        let plot_width = rect.width() - padding.left - padding.right;
                        let frac = if plot_width > 0.0 {
                            ((px - padding.left) / plot_width).clamp(0.0, 1.0) as f64
                        } else {
                            0.5
                        };
                        let window = self.session.window();
                        let viewport = window.viewport();
                        let anchor = viewport.start() + frac * viewport.width();
                        let factor = if scroll > 0.0 { WHEEL_ZOOM } else { 1.0 / WHEEL_ZOOM };
                        window.zoom(factor, anchor);
                    }
                }
                if response.clicked() {
                    let log = self.session.hovered_log().map(|entry| entry.id);
                    self.session.select_log(log);
                }
                canvases.push((pane.id(), rect, painter));
            }
        });

        if hovered.is_none() {
            if let Some(left) = self.hovered_pane.and_then(|id| self.session.pane(id)) {
                left.pointer_leave();
            }
        }
        self.hovered_pane = hovered;

        let frames = self.session.render();
        for (id, rect, painter) in &canvases {
            painter.rect_filled(*rect, 0.0, theme::canvas());
            painter.rect_stroke(*rect, 0.0, egui::Stroke::new(1.0, theme::border()));
            if let Some((_, frame)) = frames.iter().find(|(frame_id, _)| frame_id == id) {
                let mut renderer = EguiRenderer::new(painter, *rect);
                frame.draw_list.replay(&mut renderer);
            }
        }
    }
}

impl eframe::App for TrendApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_loads();
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("range").show(ctx, |ui| {
            ui.add_space(4.0);
            range_bar::show(ui, self.session.window(), &self.range);
            self.status_line(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("logs")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                ui.heading("Operation log");
                log_table::show(ui, &self.session);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_panes(ui);
        });
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::load(Path::new(&path))
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => SessionConfig::default(),
    };
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let session = AnalysisSession::new(config).context("invalid session configuration")?;
    info!(panes = session.panes().len(), "starting refiner trend explorer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 860.0])
            .with_min_inner_size([800.0, 600.0]),
        default_theme: eframe::Theme::Dark,
        ..Default::default()
    };

    eframe::run_native(
        "Refiner Trends",
        options,
        Box::new(move |cc| Box::new(TrendApp::new(cc, session, runtime))),
    )
    .map_err(|e| {
        error!("ui terminated: {}", e);
        anyhow::anyhow!("failed to run app: {}", e)
    })?;

    Ok(())
}
