//! Two-way mapping between sample index ranges and log entries
//!
//! Each log entry's `[start_time, end_time]` is converted to the inclusive
//! range of sample indices whose timestamps fall inside it. Ranges of one
//! series never overlap: on conflict the later entry is excluded and a
//! [`ValidationError`] naming both ids is kept alongside the index.

use std::ops::RangeInclusive;

use ahash::AHashMap;
use rt_core::{LogEntry, LogId, Sample, Series, SeriesKey, TimeRange, ValidationError};

/// One accepted link between a sample range and a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationLink {
    pub lo: usize,
    pub hi: usize,
    pub log_id: LogId,
}

impl CorrelationLink {
    pub fn contains(&self, index: usize) -> bool {
        self.lo <= index && index <= self.hi
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.lo..=self.hi
    }

    fn overlaps(&self, other: &CorrelationLink) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }
}

/// Index range of the samples inside `range`, found by binary search
pub fn sample_range(samples: &[Sample], range: TimeRange) -> Option<RangeInclusive<usize>> {
    let lo = samples.partition_point(|s| s.timestamp < range.start);
    let hi = samples.partition_point(|s| s.timestamp <= range.end);
    if lo < hi {
        Some(lo..=hi - 1)
    } else {
        None
    }
}

/// Correlation index for one series
#[derive(Debug, Clone, Default)]
pub struct CorrelationIndex {
    series_key: Option<SeriesKey>,
    /// Sorted by `lo`, pairwise disjoint
    links: Vec<CorrelationLink>,
    entries: AHashMap<LogId, LogEntry>,
    by_id: AHashMap<LogId, usize>,
    errors: Vec<ValidationError>,
    unlinked: Vec<LogId>,
}

impl CorrelationIndex {
    /// Build the index for `series` from the log entries of its device
    pub fn build(series: &Series, logs: &[LogEntry]) -> Self {
        let key = series.key().clone();
        let mut candidates = Vec::new();
        let mut unlinked = Vec::new();

        for entry in logs.iter().filter(|e| e.device_id == key.device_id) {
            if entry.end_time < entry.start_time {
                tracing::debug!(log = %entry.id, "log entry ends before it starts");
                unlinked.push(entry.id);
                continue;
            }
            match sample_range(series.samples(), entry.time_range()) {
                Some(range) => candidates.push((
                    CorrelationLink {
                        lo: *range.start(),
                        hi: *range.end(),
                        log_id: entry.id,
                    },
                    entry,
                )),
                None => unlinked.push(entry.id),
            }
        }

        candidates.sort_by_key(|(link, _)| (link.lo, link.hi, link.log_id));

        let mut links: Vec<CorrelationLink> = Vec::with_capacity(candidates.len());
        let mut entries = AHashMap::new();
        let mut errors = Vec::new();

        for (link, entry) in candidates {
            if entries.contains_key(&link.log_id) {
                tracing::debug!(log = %link.log_id, "duplicate log id ignored");
                continue;
            }
            // Accepted links are disjoint and sorted, so only the last one can overlap
            if let Some(previous) = links.last().filter(|prev| prev.overlaps(&link)) {
                let error = ValidationError {
                    series_key: key.clone(),
                    conflicting_ids: vec![previous.log_id, link.log_id],
                };
                tracing::warn!("{error}");
                errors.push(error);
                continue;
            }
            entries.insert(link.log_id, entry.clone());
            links.push(link);
        }

        let by_id = links
            .iter()
            .enumerate()
            .map(|(position, link)| (link.log_id, position))
            .collect();

        tracing::debug!(
            series = %key,
            linked = links.len(),
            conflicts = errors.len(),
            unlinked = unlinked.len(),
            "correlation index built"
        );

        Self {
            series_key: Some(key),
            links,
            entries,
            by_id,
            errors,
            unlinked,
        }
    }

    /// Log entry whose range contains the sample `index`
    pub fn log_for_sample(&self, index: usize) -> Option<&LogEntry> {
        let position = self.links.partition_point(|link| link.lo <= index);
        let link = self.links[..position].last()?;
        if link.contains(index) {
            self.entries.get(&link.log_id)
        } else {
            None
        }
    }

    /// Sample range linked to a log entry
    pub fn sample_range_for_log(&self, id: LogId) -> Option<RangeInclusive<usize>> {
        self.by_id.get(&id).map(|&position| self.links[position].range())
    }

    pub fn entry(&self, id: LogId) -> Option<&LogEntry> {
        self.entries.get(&id)
    }

    /// Links intersecting an index range, in index order
    pub fn links_in(&self, range: RangeInclusive<usize>) -> impl Iterator<Item = &CorrelationLink> {
        let (lo, hi) = (*range.start(), *range.end());
        let first = self.links.partition_point(|link| link.hi < lo);
        self.links[first..]
            .iter()
            .take_while(move |link| link.lo <= hi)
    }

    pub fn links(&self) -> &[CorrelationLink] {
        &self.links
    }

    /// Conflicts found while building
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Entries of this device that cover no sample
    pub fn unlinked(&self) -> &[LogId] {
        &self.unlinked
    }

    pub fn series_key(&self) -> Option<&SeriesKey> {
        self.series_key.as_ref()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rt_core::{ActionType, LogSource};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn series(len: i64) -> Series {
        let samples = (0..len).map(|i| Sample::new(at(i), i as f64)).collect();
        Series::new(SeriesKey::new("refiner-1", "gap"), samples).unwrap()
    }

    fn log(id: u64, start: i64, end: i64) -> LogEntry {
        LogEntry {
            id: LogId(id),
            start_time: at(start),
            end_time: at(end),
            device_id: "refiner-1".to_string(),
            action: ActionType::Advance,
            value_delta: 0.1,
            duration_seconds: (end - start) as f64,
            source: LogSource::Manual,
        }
    }

    #[test]
    fn test_overlapping_logs_are_reported() {
        let index = CorrelationIndex::build(&series(20), &[log(1, 5, 10), log(2, 8, 12)]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.sample_range_for_log(LogId(1)), Some(5..=10));
        assert_eq!(index.sample_range_for_log(LogId(2)), None);
        assert_eq!(
            index.errors(),
            &[ValidationError {
                series_key: SeriesKey::new("refiner-1", "gap"),
                conflicting_ids: vec![LogId(1), LogId(2)],
            }]
        );
        // the surviving entry remains usable
        assert_eq!(index.log_for_sample(11), None);
        assert_eq!(index.log_for_sample(9).map(|e| e.id), Some(LogId(1)));
    }

    #[test]
    fn test_lookup_is_bidirectional() {
        let logs = [log(3, 2, 4), log(1, 10, 10), log(2, 15, 19), log(4, 30, 40)];
        let index = CorrelationIndex::build(&series(25), &logs);

        assert_eq!(index.unlinked(), &[LogId(4)]);
        for i in 0..25 {
            if let Some(entry) = index.log_for_sample(i) {
                assert!(index.sample_range_for_log(entry.id).unwrap().contains(&i));
            }
        }
        assert_eq!(index.log_for_sample(0), None);
        assert_eq!(index.log_for_sample(10).map(|e| e.id), Some(LogId(1)));
        assert_eq!(index.log_for_sample(19).map(|e| e.id), Some(LogId(2)));
    }

    #[test]
    fn test_range_between_samples() {
        let samples: Vec<_> = [0, 10, 20, 30].iter().map(|&s| Sample::new(at(s), 0.0)).collect();
        assert_eq!(sample_range(&samples, TimeRange::new(at(5), at(25))), Some(1..=2));
        assert_eq!(sample_range(&samples, TimeRange::new(at(11), at(19))), None);
        assert_eq!(sample_range(&samples, TimeRange::new(at(-5), at(0))), Some(0..=0));
    }

    #[test]
    fn test_other_devices_and_inverted_entries_skipped() {
        let mut foreign = log(1, 0, 5);
        foreign.device_id = "refiner-2".to_string();
        let inverted = log(2, 9, 3);

        let index = CorrelationIndex::build(&series(10), &[foreign, inverted]);
        assert!(index.is_empty());
        assert_eq!(index.unlinked(), &[LogId(2)]);
    }

    #[test]
    fn test_links_in_window() {
        let logs = [log(1, 0, 2), log(2, 5, 6), log(3, 9, 12)];
        let index = CorrelationIndex::build(&series(20), &logs);
        let ids: Vec<_> = index.links_in(4..=10).map(|l| l.log_id).collect();
        assert_eq!(ids, vec![LogId(2), LogId(3)]);
    }
}
