//! Cross-pane hover synchronization
//!
//! One [`SyncBus`] is shared by every pane bound to the same
//! [`TimeWindow`](crate::viewport::TimeWindow). A pane publishes the absolute
//! sample index under the pointer and the bus fans it out to all subscribers,
//! the publisher included.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::viewport::{RangeSubscriber, TimeWindow, Viewport};

/// Hover state shared across panes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    /// Absolute sample index under the pointer, if any
    pub index: Option<usize>,
}

/// Trait for panes that react to the shared hover index
pub trait HoverSubscriber: Send + Sync {
    fn on_hover(&self, index: Option<usize>);
}

/// Broadcast channel for the hover index
pub struct SyncBus {
    hover: Arc<RwLock<HoverState>>,
    subscribers: Arc<RwLock<Vec<Weak<dyn HoverSubscriber>>>>,
}

impl SyncBus {
    pub fn new() -> Self {
        Self {
            hover: Arc::new(RwLock::new(HoverState::default())),
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a bus that clears its hover whenever `window` changes
    pub fn for_window(window: &TimeWindow) -> Arc<Self> {
        let bus = Arc::new(Self::new());
        window.add_subscriber(bus.clone());
        bus
    }

    /// Get the current hover state
    pub fn hover(&self) -> HoverState {
        *self.hover.read()
    }

    /// Publish a hover index (or `None` to clear) to every subscriber
    pub fn publish(&self, index: Option<usize>) {
        *self.hover.write() = HoverState { index };

        for subscriber in self.live_subscribers() {
            subscriber.on_hover(index);
        }
    }

    /// Clear the hover; a no-op when nothing is hovered
    pub fn clear(&self) {
        if self.hover().index.is_some() {
            self.publish(None);
        }
    }

    /// Register a subscriber; it is held weakly
    pub fn subscribe(&self, subscriber: Arc<dyn HoverSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.live_subscribers().len()
    }

    fn live_subscribers(&self) -> Vec<Arc<dyn HoverSubscriber>> {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSubscriber for SyncBus {
    fn on_range_changed(&self, _viewport: Viewport) {
        self.clear();
    }
}
