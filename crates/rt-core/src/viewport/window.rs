//! Time window controller implementation

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{DragHandle, DragMode, RangeSubscriber, Viewport, DEFAULT_MIN_GAP_PCT};
use crate::error::CoreError;

/// Window state stored internally
#[derive(Debug, Clone)]
struct WindowState {
    viewport: Viewport,
    mode: DragMode,
    min_gap_pct: f64,
}

/// The viewport controller shared by every pane of a session
pub struct TimeWindow {
    state: Arc<RwLock<WindowState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn RangeSubscriber>>>>,
}

impl TimeWindow {
    /// Create a window over the full axis with the default minimum gap
    pub fn new() -> Self {
        Self::from_state(WindowState {
            viewport: Viewport::FULL,
            mode: DragMode::Idle,
            min_gap_pct: DEFAULT_MIN_GAP_PCT,
        })
    }

    /// Create a window with a custom minimum gap, in percent
    pub fn with_min_gap(min_gap_pct: f64) -> Result<Self, CoreError> {
        if !(min_gap_pct > 0.0 && min_gap_pct <= 100.0) {
            return Err(CoreError::InvalidMinGap(min_gap_pct));
        }

        Ok(Self::from_state(WindowState {
            viewport: Viewport::FULL,
            mode: DragMode::Idle,
            min_gap_pct,
        }))
    }

    fn from_state(state: WindowState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current visible range
    pub fn viewport(&self) -> Viewport {
        self.state.read().viewport
    }

    pub fn min_gap_pct(&self) -> f64 {
        self.state.read().min_gap_pct
    }

    pub fn drag_mode(&self) -> DragMode {
        self.state.read().mode
    }

    /// Start dragging one of the window edges
    pub fn begin_drag(&self, handle: DragHandle) {
        self.state.write().mode = DragMode::Dragging(handle);
    }

    /// Move the dragged edge to `pointer_pct`, keeping the minimum gap.
    ///
    /// Returns the new viewport, or `None` when no drag is in progress or the
    /// pointer position is not a number.
    pub fn update_drag(&self, pointer_pct: f64) -> Option<Viewport> {
        if !pointer_pct.is_finite() {
            return None;
        }
        let pointer = pointer_pct.clamp(0.0, 100.0);

        let mut state = self.state.write();
        let gap = state.min_gap_pct;
        let current = state.viewport;
        let (start, end) = match state.mode {
            DragMode::Idle => return None,
            DragMode::Dragging(DragHandle::Start) => {
                (pointer.min(current.end() - gap).max(0.0), current.end())
            }
            DragMode::Dragging(DragHandle::End) => {
                (current.start(), pointer.max(current.start() + gap).min(100.0))
            }
        };
        let viewport = Viewport {
            start_pct: start,
            end_pct: end,
        };
        debug_assert!(
            viewport.is_valid(gap),
            "drag produced invalid viewport {viewport:?}"
        );
        state.viewport = viewport;
        drop(state);

        self.notify_subscribers(viewport);
        Some(viewport)
    }

    /// Return to idle
    pub fn end_drag(&self) {
        self.state.write().mode = DragMode::Idle;
    }

    /// Set the visible range directly
    pub fn set_range(&self, start_pct: f64, end_pct: f64) -> Result<(), CoreError> {
        let viewport = Viewport::new(start_pct, end_pct, self.min_gap_pct())?;
        self.apply(viewport);
        Ok(())
    }

    /// Show the whole axis again
    pub fn reset(&self) {
        self.apply(Viewport::FULL);
    }

    /// Shift the window by `delta_pct`, preserving its width
    pub fn pan_by(&self, delta_pct: f64) {
        if !delta_pct.is_finite() {
            return;
        }
        let current = self.viewport();
        let width = current.width();
        let start = (current.start() + delta_pct).clamp(0.0, 100.0 - width);
        self.apply(Viewport {
            start_pct: start,
            end_pct: start + width,
        });
    }

    /// Scale the window width by `factor` around `anchor_pct`.
    ///
    /// Factors below one zoom in. The width never drops below the minimum gap
    /// and never exceeds the full axis.
    pub fn zoom(&self, factor: f64, anchor_pct: f64) {
        if !(factor.is_finite() && factor > 0.0 && anchor_pct.is_finite()) {
            return;
        }
        let current = self.viewport();
        let gap = self.min_gap_pct();
        let width = current.width();
        let new_width = (width * factor).clamp(gap, 100.0);
        let anchor = anchor_pct.clamp(current.start(), current.end());
        let ratio = if width > 0.0 {
            (anchor - current.start()) / width
        } else {
            0.5
        };
        let start = (anchor - ratio * new_width).clamp(0.0, 100.0 - new_width);
        self.apply(Viewport {
            start_pct: start,
            end_pct: start + new_width,
        });
    }

    fn apply(&self, viewport: Viewport) {
        let mut state = self.state.write();
        debug_assert!(viewport.is_valid(state.min_gap_pct));
        if state.viewport == viewport {
            return;
        }
        state.viewport = viewport;
        drop(state);
        self.notify_subscribers(viewport);
    }

    /// Add a subscriber; it is held weakly
    pub fn add_subscriber(&self, subscriber: Arc<dyn RangeSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Notify all live subscribers of a range change
    fn notify_subscribers(&self, viewport: Viewport) {
        let live: Vec<Arc<dyn RangeSubscriber>> = {
            let mut subscribers = self.subscribers.write();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        tracing::trace!(
            start = viewport.start(),
            end = viewport.end(),
            subscribers = live.len(),
            "time window changed"
        );

        for subscriber in live {
            subscriber.on_range_changed(viewport);
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new()
    }
}
