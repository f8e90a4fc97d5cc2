use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// Session-wide event bus for host UI elements
///
/// Handlers run synchronously inside `publish` and must not publish events
/// themselves.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Downcast a type-erased event
pub fn downcast<E: Event>(event: &dyn Event) -> Option<&E> {
    event.as_any().downcast_ref::<E>()
}

/// Events emitted by an analysis session
pub mod events {
    use super::Event;
    use crate::error::{DataError, ValidationError};
    use crate::model::{LogId, SeriesKey};

    /// The visible window changed
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct RangeChanged {
        pub start: f64,
        pub end: f64,
    }

    /// The shared hover index changed
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HoverChanged {
        pub index: Option<usize>,
    }

    /// New series data was swapped into the store
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SeriesReplaced {
        pub version: u64,
        pub series_count: usize,
    }

    /// A fetch result arrived after a newer one and was ignored
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StaleResultDiscarded {
        pub version: u64,
        pub current: u64,
    }

    /// A sample could not be drawn and was skipped
    #[derive(Debug, Clone, PartialEq)]
    pub struct SampleDropped {
        pub error: DataError,
    }

    /// A log entry was excluded from a correlation index
    #[derive(Debug, Clone, PartialEq)]
    pub struct CorrelationConflict {
        pub error: ValidationError,
    }

    /// A fetch collaborator failed; the host may retry
    #[derive(Debug, Clone, PartialEq)]
    pub struct FetchFailed {
        pub series: Option<SeriesKey>,
        pub message: String,
        pub retryable: bool,
    }

    /// A log entry was selected (or the selection cleared)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LogSelected {
        pub id: Option<LogId>,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        RangeChanged,
        HoverChanged,
        SeriesReplaced,
        StaleResultDiscarded,
        SampleDropped,
        CorrelationConflict,
        FetchFailed,
        LogSelected
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(handler);
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{HoverChanged, RangeChanged};
    use super::*;

    #[test]
    fn test_handlers_receive_only_their_type() {
        let bus = EventBus::new();
        let ranges = Arc::new(Mutex::new(Vec::new()));
        let sink = ranges.clone();
        bus.subscribe::<RangeChanged>(handler_from_fn(move |event| {
            if let Some(changed) = downcast::<RangeChanged>(event) {
                sink.lock().push((changed.start, changed.end));
            }
        }));

        bus.publish(HoverChanged { index: Some(3) });
        bus.publish(RangeChanged { start: 10.0, end: 20.0 });

        assert_eq!(*ranges.lock(), vec![(10.0, 20.0)]);
    }
}
