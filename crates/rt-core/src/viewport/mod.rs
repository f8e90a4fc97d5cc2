//! Shared time window over the full time axis
//!
//! A [`Viewport`] is a percentage range `[start, end]` of the loaded time axis.
//! The [`TimeWindow`] controller is its only writer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

mod subscriber;
mod window;

pub use subscriber::RangeSubscriber;
pub use window::TimeWindow;

/// Default minimum width of the window, in percent of the axis
pub const DEFAULT_MIN_GAP_PCT: f64 = 5.0;

/// Tolerance for floating point comparisons on percentages
pub(crate) const PCT_EPSILON: f64 = 1e-9;

/// Visible percentage range of the time axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    start_pct: f64,
    end_pct: f64,
}

impl Viewport {
    /// The whole axis
    pub const FULL: Viewport = Viewport {
        start_pct: 0.0,
        end_pct: 100.0,
    };

    /// Create a validated viewport
    pub fn new(start_pct: f64, end_pct: f64, min_gap_pct: f64) -> Result<Self, CoreError> {
        let viewport = Self { start_pct, end_pct };
        if viewport.is_valid(min_gap_pct) {
            Ok(viewport)
        } else {
            Err(CoreError::InvalidViewport {
                start: start_pct,
                end: end_pct,
                min_gap: min_gap_pct,
            })
        }
    }

    pub fn start(&self) -> f64 {
        self.start_pct
    }

    pub fn end(&self) -> f64 {
        self.end_pct
    }

    pub fn width(&self) -> f64 {
        self.end_pct - self.start_pct
    }

    /// Bounds and minimum gap both hold
    pub fn is_valid(&self, min_gap_pct: f64) -> bool {
        self.start_pct.is_finite()
            && self.end_pct.is_finite()
            && self.start_pct >= 0.0
            && self.end_pct <= 100.0
            && self.width() + PCT_EPSILON >= min_gap_pct
    }

    pub fn contains_pct(&self, pct: f64) -> bool {
        self.start_pct <= pct && pct <= self.end_pct
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

/// Which window edge is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragHandle {
    Start,
    End,
}

/// Drag interaction state of the time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    Dragging(DragHandle),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_validation() {
        assert!(Viewport::new(0.0, 100.0, 5.0).is_ok());
        assert!(Viewport::new(10.0, 15.0, 5.0).is_ok());
        assert!(Viewport::new(10.0, 14.0, 5.0).is_err());
        assert!(Viewport::new(-1.0, 50.0, 5.0).is_err());
        assert!(Viewport::new(0.0, 101.0, 5.0).is_err());
        assert!(Viewport::new(f64::NAN, 50.0, 5.0).is_err());
    }

    #[test]
    fn test_default_is_full_axis() {
        let viewport = Viewport::default();
        assert_eq!(viewport.start(), 0.0);
        assert_eq!(viewport.end(), 100.0);
        assert!(viewport.contains_pct(42.0));
    }
}
