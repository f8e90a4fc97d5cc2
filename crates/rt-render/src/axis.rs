//! Gridlines and axis labels

use chrono::{DateTime, Utc};
use rt_core::{Rgba, Sample};

use crate::draw_list::{DrawCommand, DrawList, Point, Stroke, TextAnchor};
use crate::mapper::PlotFrame;

#[derive(Debug, Clone, PartialEq)]
pub struct AxisStyle {
    pub y_ticks: usize,
    pub x_labels: usize,
    pub grid_color: Rgba,
    pub axis_color: Rgba,
    pub label_color: Rgba,
    pub label_size: f32,
}

impl Default for AxisStyle {
    fn default() -> Self {
        Self {
            y_ticks: 5,
            x_labels: 6,
            grid_color: Rgba::from_rgb(60, 60, 60).with_alpha(160),
            axis_color: Rgba::from_rgb(110, 110, 110),
            label_color: Rgba::from_rgb(160, 160, 160),
            label_size: 10.0,
        }
    }
}

/// Round step of the 1-2-5 family close to `raw`
fn nice_step(raw: f64) -> f64 {
    let base = 10f64.powf(raw.abs().log10().floor());
    let n = raw / base;
    let nice = if n <= 1.0 {
        1.0
    } else if n <= 2.0 {
        2.0
    } else if n <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Evenly spaced round values inside `[min, max]`
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || target < 2 {
        return Vec::new();
    }
    let span = max - min;
    if span <= 0.0 {
        return vec![min];
    }
    let step = nice_step(span / target as f64);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Label text for a value tick, with decimals matched to the step
pub fn format_value(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{:.*}", decimals, value)
}

/// Label text for a timestamp, adding the date when the span exceeds a day
pub fn format_time(timestamp: DateTime<Utc>, span: chrono::Duration) -> String {
    if span > chrono::Duration::days(1) {
        timestamp.format("%m-%d %H:%M").to_string()
    } else {
        timestamp.format("%H:%M").to_string()
    }
}

/// Draws the value grid and time labels of a pane
#[derive(Debug, Clone, Default)]
pub struct AxisRenderer {
    style: AxisStyle,
}

impl AxisRenderer {
    pub fn new(style: AxisStyle) -> Self {
        Self { style }
    }

    /// Grid, axis line and labels for `samples` (the visible slice)
    pub fn render(&self, frame: &PlotFrame, samples: &[Sample]) -> DrawList {
        let mut list = DrawList::new();
        let mapper = frame.mapper(samples.len());
        let (top_left, bottom_right) = mapper.plot_rect();
        let size = self.style.label_size;

        let domain = frame.y_domain;
        let ticks = nice_ticks(domain.min, domain.max, self.style.y_ticks);
        let step = match ticks.as_slice() {
            [a, b, ..] => b - a,
            _ => domain.range().abs().max(f64::EPSILON),
        };
        for value in ticks {
            let y = mapper.y(value);
            list.push(DrawCommand::Line {
                from: Point::new(top_left.x, y),
                to: Point::new(bottom_right.x, y),
                stroke: Stroke::solid(1.0, self.style.grid_color),
            });
            list.push(DrawCommand::Text {
                position: Point::new(top_left.x - 6.0, y),
                text: format_value(value, step),
                color: self.style.label_color,
                size,
                anchor: TextAnchor::End,
            });
        }

        list.push(DrawCommand::Line {
            from: Point::new(top_left.x, bottom_right.y),
            to: bottom_right,
            stroke: Stroke::solid(1.0, self.style.axis_color),
        });

        if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
            let span = last.timestamp - first.timestamp;
            for i in label_indices(samples.len(), self.style.x_labels) {
                list.push(DrawCommand::Text {
                    position: Point::new(mapper.x(i), bottom_right.y + size + 4.0),
                    text: format_time(samples[i].timestamp, span),
                    color: self.style.label_color,
                    size,
                    anchor: TextAnchor::Middle,
                });
            }
        }

        list
    }
}

/// Up to `count` evenly spaced indices of `0..len`, first and last included
fn label_indices(len: usize, count: usize) -> Vec<usize> {
    match (len, count) {
        (0, _) | (_, 0) => Vec::new(),
        (1, _) | (_, 1) => vec![0],
        _ => {
            let count = count.min(len);
            let mut indices: Vec<usize> = (0..count)
                .map(|k| ((k * (len - 1)) as f64 / (count - 1) as f64).round() as usize)
                .collect();
            indices.dedup();
            indices
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rt_core::{Padding, YDomain};

    #[test]
    fn test_nice_ticks_are_round_and_inside() {
        let ticks = nice_ticks(9.8, 12.2, 5);
        assert_eq!(ticks.len(), 5);
        assert!((ticks[0] - 10.0).abs() < 1e-9);
        assert!((ticks[4] - 12.0).abs() < 1e-9);
        assert!(nice_ticks(f64::NAN, 1.0, 5).is_empty());
        assert_eq!(nice_ticks(3.0, 3.0, 5), vec![3.0]);
    }

    #[test]
    fn test_format_value_decimals() {
        assert_eq!(format_value(0.35, 0.05), "0.35");
        assert_eq!(format_value(450.0, 20.0), "450");
        assert_eq!(format_value(10.5, 0.5), "10.5");
    }

    #[test]
    fn test_label_indices() {
        assert_eq!(label_indices(11, 3), vec![0, 5, 10]);
        assert_eq!(label_indices(2, 6), vec![0, 1]);
        assert!(label_indices(0, 6).is_empty());
    }

    #[test]
    fn test_time_labels_under_plot() {
        let samples: Vec<Sample> = (0..4)
            .map(|i| Sample::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, i * 15, 0).unwrap(), 1.0))
            .collect();
        let frame = PlotFrame::new(300.0, 120.0, Padding::default(), YDomain { min: 0.0, max: 2.0 });
        let list = AxisRenderer::default().render(&frame, &samples);
        let labels: Vec<&str> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, anchor: TextAnchor::Middle, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["08:00", "08:15", "08:30", "08:45"]);
    }
}
