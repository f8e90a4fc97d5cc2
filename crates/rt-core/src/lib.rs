//! Core functionality for the refiner trend explorer
//!
//! This crate provides the data model, the shared time window, the hover
//! synchronization bus and the event bus that every chart pane builds on.

pub mod error;
pub mod events;
pub mod model;
pub mod plot;
pub mod sync;
pub mod viewport;

// Re-export commonly used types
pub use error::{CoreError, DataError, ValidationError};
pub use events::EventBus;
pub use model::{
    ActionType, LogEntry, LogId, LogSource, Rgba, Sample, Series, SeriesKey, Threshold,
    TimeRange,
};
pub use plot::{Padding, YDomain};
pub use sync::{HoverState, HoverSubscriber, SyncBus};
pub use viewport::{
    DragHandle, DragMode, RangeSubscriber, TimeWindow, Viewport, DEFAULT_MIN_GAP_PCT,
};
