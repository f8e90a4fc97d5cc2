//! Visible slice and value domain computation

use std::ops::RangeInclusive;

use rt_core::{Sample, Series, Threshold, Viewport, YDomain};
use thiserror::Error;

/// Default padding above and below the value range, as a share of the range
pub const DEFAULT_Y_MARGIN_RATIO: f64 = 0.1;

/// Half span given to a flat value range, as a share of its magnitude
const FLAT_HALF_SPAN_RATIO: f64 = 0.05;

/// Half span given to a flat range at zero
const FLAT_HALF_SPAN_AT_ZERO: f64 = 1.0;

/// Fewer than two samples; callers draw a placeholder instead of a path
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient data: {len} sample(s)")]
pub struct InsufficientData {
    pub len: usize,
}

/// The part of a series that falls inside the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleSlice<'a> {
    start_idx: usize,
    end_idx: usize,
    samples: &'a [Sample],
}

impl<'a> VisibleSlice<'a> {
    /// Absolute index of the first visible sample
    pub fn start_idx(&self) -> usize {
        self.start_idx
    }

    /// Absolute index of the last visible sample (inclusive)
    pub fn end_idx(&self) -> usize {
        self.end_idx
    }

    pub fn samples(&self) -> &'a [Sample] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn absolute_index(&self, local: usize) -> usize {
        self.start_idx + local
    }

    /// Local position of an absolute index, if it is visible
    pub fn local_index(&self, absolute: usize) -> Option<usize> {
        if (self.start_idx..=self.end_idx).contains(&absolute) {
            Some(absolute - self.start_idx)
        } else {
            None
        }
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.start_idx..=self.end_idx
    }
}

/// Index bounds of the visible window over `len` samples.
///
/// At least three samples are kept whenever the series has them: a window
/// narrower than that is widened to the right, or to the left at the end of
/// the array.
pub fn slice_bounds(len: usize, viewport: Viewport) -> Result<RangeInclusive<usize>, InsufficientData> {
    if len < 2 {
        return Err(InsufficientData { len });
    }
    let last = len - 1;
    let span = last as f64;

    let mut start_idx = ((viewport.start() / 100.0 * span).floor() as usize).min(last);
    let mut end_idx = ((viewport.end() / 100.0 * span).ceil() as usize).min(last);

    if end_idx < start_idx + 2 {
        end_idx = (start_idx + 2).min(last);
        if end_idx < start_idx + 2 {
            start_idx = end_idx.saturating_sub(2);
        }
    }

    Ok(start_idx..=end_idx)
}

/// Slice a series to the viewport
pub fn visible_slice(series: &Series, viewport: Viewport) -> Result<VisibleSlice<'_>, InsufficientData> {
    let bounds = slice_bounds(series.len(), viewport)?;
    let (start_idx, end_idx) = (*bounds.start(), *bounds.end());
    Ok(VisibleSlice {
        start_idx,
        end_idx,
        samples: &series.samples()[bounds],
    })
}

/// Shared value domain for a set of visible samples and threshold bands.
///
/// Non-finite values are ignored. A flat range is first widened around its
/// value by 5% of the magnitude (±1 at zero). The min/max is then padded on
/// both sides by `margin_ratio` times its range. Returns `None` when nothing
/// is finite.
pub fn y_domain<'a, I>(inputs: I, margin_ratio: f64) -> Option<YDomain>
where
    I: IntoIterator<Item = (&'a [Sample], Option<Threshold>)>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut include = |value: f64| {
        if value.is_finite() {
            min = min.min(value);
            max = max.max(value);
        }
    };

    for (samples, threshold) in inputs {
        for sample in samples {
            include(sample.value);
        }
        if let Some(threshold) = threshold {
            include(threshold.lower());
            include(threshold.upper());
        }
    }

    if !(min.is_finite() && max.is_finite()) {
        return None;
    }

    let mid = (min + max) / 2.0;
    if max - min <= f64::EPSILON * mid.abs() {
        let flat = if mid == 0.0 {
            FLAT_HALF_SPAN_AT_ZERO
        } else {
            mid.abs() * FLAT_HALF_SPAN_RATIO
        };
        min = mid - flat;
        max = mid + flat;
    }

    let half = (max - min) / 2.0 + (max - min) * margin_ratio.max(0.0);
    Some(YDomain {
        min: mid - half,
        max: mid + half,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rt_core::SeriesKey;

    fn series(values: &[f64]) -> Series {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(), *v))
            .collect();
        Series::new(SeriesKey::new("refiner-1", "gap"), samples).unwrap()
    }

    #[test]
    fn test_full_viewport_keeps_all_samples() {
        let series = series(&[10.0, 12.0, 11.0]);
        let slice = visible_slice(&series, Viewport::FULL).unwrap();
        assert_eq!(slice.len(), 3);
        assert_eq!(slice.range(), 0..=2);

        let domain = y_domain([(slice.samples(), None)], DEFAULT_Y_MARGIN_RATIO).unwrap();
        assert!((domain.min - 9.8).abs() < 1e-12);
        assert!((domain.max - 12.2).abs() < 1e-12);
        assert!(((domain.min + domain.max) / 2.0 - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_data() {
        assert_eq!(
            visible_slice(&series(&[1.0]), Viewport::FULL).unwrap_err(),
            InsufficientData { len: 1 }
        );
        assert_eq!(slice_bounds(0, Viewport::FULL).unwrap_err().len, 0);
        assert_eq!(slice_bounds(2, Viewport::FULL).unwrap(), 0..=1);
    }

    #[test]
    fn test_narrow_window_keeps_three_points() {
        for len in [3usize, 4, 7, 20, 101, 1000] {
            let mut start: f64 = 0.0;
            while start <= 95.0 {
                for width in [5.0, 5.5, 13.0, 50.0] {
                    let end = (start + width).min(100.0);
                    if end - start < 5.0 {
                        continue;
                    }
                    let viewport = Viewport::new(start, end, 5.0).unwrap();
                    let bounds = slice_bounds(len, viewport).unwrap();
                    assert!(
                        bounds.end() - bounds.start() >= 2,
                        "len {len}, viewport {viewport:?} -> {bounds:?}"
                    );
                    assert!(*bounds.end() < len);
                }
                start += 2.5;
            }
        }
    }

    #[test]
    fn test_window_at_array_end_expands_left() {
        let viewport = Viewport::new(95.0, 100.0, 5.0).unwrap();
        assert_eq!(slice_bounds(10, viewport).unwrap(), 7..=9);
    }

    #[test]
    fn test_local_and_absolute_indices() {
        let series = series(&[0.0; 21]);
        let viewport = Viewport::new(50.0, 75.0, 5.0).unwrap();
        let slice = visible_slice(&series, viewport).unwrap();
        assert_eq!(slice.range(), 10..=15);
        assert_eq!(slice.local_index(12), Some(2));
        assert_eq!(slice.local_index(16), None);
        assert_eq!(slice.absolute_index(2), 12);
    }

    #[test]
    fn test_domain_includes_threshold_and_skips_nan() {
        let series = series(&[10.0, f64::NAN, 12.0]);
        let threshold = Threshold::new(15.0, 1.0);
        let domain = y_domain([(series.samples(), Some(threshold))], 0.0).unwrap();
        assert_eq!(domain, YDomain { min: 10.0, max: 16.0 });

        let empty: [(&[Sample], Option<Threshold>); 0] = [];
        assert!(y_domain(empty, 0.1).is_none());
    }

    #[test]
    fn test_flat_series_gets_a_span() {
        let steady = series(&[0.35; 5]);
        let domain = y_domain([(steady.samples(), None)], DEFAULT_Y_MARGIN_RATIO).unwrap();
        assert!(domain.min < 0.35 && 0.35 < domain.max, "{domain:?}");
        assert!(((domain.min + domain.max) / 2.0 - 0.35).abs() < 1e-12);

        let zeros = series(&[0.0; 3]);
        let domain = y_domain([(zeros.samples(), None)], 0.0).unwrap();
        assert_eq!(domain, YDomain { min: -1.0, max: 1.0 });
    }
}
