//! Chart panes and the analysis session that links them

mod pane;
pub mod palette;
mod session;

pub use pane::{HoverReadout, Pane, PaneFrame, PaneId, PaneState, PaneStatus, ReadoutValue};
pub use session::AnalysisSession;

use std::sync::Arc;

use ahash::AHashMap;
use rt_core::{LogId, SeriesKey};
use rt_data::CorrelationIndex;

/// Correlation indices of the loaded series, by key
pub type Correlations = AHashMap<SeriesKey, CorrelationIndex>;

/// Context passed to panes during rendering
#[derive(Clone, Default)]
pub struct ViewContext {
    pub correlations: Arc<Correlations>,

    /// Log entry selected in the linked log list
    pub selected_log: Option<LogId>,
}
