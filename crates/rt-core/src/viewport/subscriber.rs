//! Time window subscriber trait

use super::Viewport;

/// Trait for components that need to respond to window changes
pub trait RangeSubscriber: Send + Sync {
    /// Called after the visible range changed
    fn on_range_changed(&self, viewport: Viewport);
}
