//! Series store with copy-on-write snapshots
//!
//! The store is written by exactly one party, the fetch completion handler,
//! through [`SeriesStore::replace_series`]. Readers take an
//! `Arc<StoreSnapshot>` and keep it for the duration of a render pass; a write
//! swaps in a new snapshot and never touches the one being read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rt_core::{Series, SeriesKey};

mod slice;

pub use slice::{
    slice_bounds, visible_slice, y_domain, InsufficientData, VisibleSlice,
    DEFAULT_Y_MARGIN_RATIO,
};

/// Immutable view of the store contents at one version
#[derive(Debug, Default)]
pub struct StoreSnapshot {
    version: u64,
    series: IndexMap<SeriesKey, Arc<Series>>,
}

impl StoreSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&Arc<Series>> {
        self.series.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Series>> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Result of offering new data to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied { version: u64, series_count: usize },
    /// Superseded by a newer request; the data was dropped
    Stale { version: u64, current: u64 },
}

/// Holds the series of an analysis session
pub struct SeriesStore {
    snapshot: Arc<RwLock<Arc<StoreSnapshot>>>,
    next_version: AtomicU64,
}

impl SeriesStore {
    /// Create an empty store at version 0
    pub fn new() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(StoreSnapshot::default()))),
            next_version: AtomicU64::new(0),
        }
    }

    /// Tag for the next fetch request; strictly increasing
    pub fn next_request_version(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Version of the data currently held
    pub fn version(&self) -> u64 {
        self.snapshot.read().version
    }

    /// Current snapshot; cheap to clone and safe to hold across a write
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn series(&self, key: &SeriesKey) -> Option<Arc<Series>> {
        self.snapshot.read().get(key).cloned()
    }

    /// Replace the whole store with `series` fetched under `version`.
    ///
    /// Data tagged with a version lower than the current one is discarded.
    /// Later entries win when a key appears twice.
    pub fn replace_series(&self, version: u64, series: Vec<Series>) -> ReplaceOutcome {
        let mut guard = self.snapshot.write();
        let current = guard.version;
        if version < current {
            tracing::debug!(version, current, "discarding stale series data");
            return ReplaceOutcome::Stale { version, current };
        }

        let series: IndexMap<SeriesKey, Arc<Series>> = series
            .into_iter()
            .map(|s| (s.key().clone(), Arc::new(s)))
            .collect();
        let series_count = series.len();
        *guard = Arc::new(StoreSnapshot { version, series });
        drop(guard);

        self.next_version.fetch_max(version, Ordering::SeqCst);
        tracing::info!(version, series_count, "series store replaced");
        ReplaceOutcome::Applied {
            version,
            series_count,
        }
    }
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new()
    }
}
