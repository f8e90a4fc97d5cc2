//! Smooth curve construction for single and multi-series charts

use rt_core::{DataError, Rgba, Sample, SeriesKey, Threshold};

use crate::draw_list::{Dash, DrawCommand, DrawList, Fill, Path, Point, Stroke, TextAnchor};
use crate::mapper::{CoordinateMapper, PlotFrame};

/// Visible samples of one series together with their display metadata
#[derive(Debug, Clone, Copy)]
pub struct SeriesData<'a> {
    pub key: &'a SeriesKey,
    pub label: &'a str,
    /// Visible slice of the series
    pub samples: &'a [Sample],
    /// Absolute index of `samples[0]` in the full series
    pub index_offset: usize,
    pub color: Rgba,
    pub threshold: Option<Threshold>,
}

/// What one pane draws
#[derive(Debug, Clone)]
pub enum Chart<'a> {
    /// One curve with area fill and optional threshold band
    Single(SeriesData<'a>),
    /// Several overlaid curves with a legend, no fill
    Multi(Vec<SeriesData<'a>>),
}

/// Visual parameters of rendered curves
#[derive(Debug, Clone, PartialEq)]
pub struct CurveStyle {
    pub line_width: f32,
    pub marker_radius: f32,
    /// Alpha factor of the area fill at the top of the plot
    pub fill_top_alpha: f32,
    /// Alpha factor of the area fill at the baseline
    pub fill_bottom_alpha: f32,
    pub threshold_color: Rgba,
    pub band_alpha: f32,
    pub threshold_dash: Dash,
    pub legend_text_size: f32,
    pub legend_text_color: Rgba,
}

impl Default for CurveStyle {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            marker_radius: 3.5,
            fill_top_alpha: 0.35,
            fill_bottom_alpha: 0.0,
            threshold_color: Rgba::from_rgb(255, 200, 80),
            band_alpha: 0.12,
            threshold_dash: Dash { on: 6.0, off: 4.0 },
            legend_text_size: 11.0,
            legend_text_color: Rgba::from_rgb(200, 200, 200),
        }
    }
}

/// Draw list for a chart plus the samples that could not be drawn
#[derive(Debug, Clone, Default)]
pub struct CurveOutput {
    pub draw_list: DrawList,
    pub errors: Vec<DataError>,
}

/// Builds draw lists for charts
#[derive(Debug, Clone, Default)]
pub struct CurveRenderer {
    style: CurveStyle,
}

impl CurveRenderer {
    pub fn new(style: CurveStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &CurveStyle {
        &self.style
    }

    /// Smooth path through `points`.
    ///
    /// Each segment is a cubic with both control points one third of the
    /// horizontal distance inward and at the height of their end point, so
    /// tangents are horizontal at every point and the curve never leaves the
    /// vertical span of a segment.
    pub fn smooth_path(points: &[Point]) -> Path {
        let mut path = Path::new();
        let Some(first) = points.first() else {
            return path;
        };
        path.move_to(*first);
        for pair in points.windows(2) {
            let (p0, p1) = (pair[0], pair[1]);
            let dx = p1.x - p0.x;
            let c1 = Point::new(p0.x + dx / 3.0, p0.y);
            let c2 = Point::new(p1.x - dx / 3.0, p1.y);
            path.cubic_to(c1, c2, p1);
        }
        path
    }

    /// Pixel positions of the finite samples of `series`.
    ///
    /// Non-finite samples are reported with their absolute index and skipped,
    /// the remaining points keep their own x position.
    pub fn project(
        series: &SeriesData<'_>,
        mapper: &CoordinateMapper,
        errors: &mut Vec<DataError>,
    ) -> Vec<Point> {
        let mut points = Vec::with_capacity(series.samples.len());
        for (i, sample) in series.samples.iter().enumerate() {
            if sample.value.is_finite() {
                points.push(mapper.point(i, sample.value));
            } else {
                errors.push(DataError {
                    series_key: series.key.clone(),
                    index: series.index_offset + i,
                });
            }
        }
        points
    }

    /// Build the draw list of `chart` inside `frame`
    pub fn render(&self, chart: &Chart<'_>, frame: &PlotFrame) -> CurveOutput {
        let mut output = CurveOutput::default();
        match chart {
            Chart::Single(series) => self.render_single(series, frame, &mut output),
            Chart::Multi(series) => self.render_multi(series, frame, &mut output),
        }
        output
    }

    fn render_single(&self, series: &SeriesData<'_>, frame: &PlotFrame, output: &mut CurveOutput) {
        let mapper = frame.mapper(series.samples.len());
        let points = Self::project(series, &mapper, &mut output.errors);
        let list = &mut output.draw_list;

        match points.as_slice() {
            [] => {}
            [point] => list.push(self.marker(*point, series.color)),
            _ => {
                if let Some(threshold) = series.threshold {
                    self.push_threshold(list, threshold, &mapper);
                }

                let (top_left, _) = mapper.plot_rect();
                let baseline = mapper.baseline();
                let mut area = Self::smooth_path(&points);
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    area.line_to(Point::new(last.x, baseline));
                    area.line_to(Point::new(first.x, baseline));
                }
                area.close();
                list.push(DrawCommand::Path {
                    path: area,
                    stroke: None,
                    fill: Some(Fill::VerticalGradient {
                        top: top_left.y,
                        bottom: baseline,
                        top_color: series.color.fade(self.style.fill_top_alpha),
                        bottom_color: series.color.fade(self.style.fill_bottom_alpha),
                    }),
                });

                list.push(DrawCommand::Path {
                    path: Self::smooth_path(&points),
                    stroke: Some(Stroke::solid(self.style.line_width, series.color)),
                    fill: None,
                });
            }
        }
    }

    fn render_multi(&self, series: &[SeriesData<'_>], frame: &PlotFrame, output: &mut CurveOutput) {
        let mut drawn = Vec::with_capacity(series.len());
        for data in series {
            let mapper = frame.mapper(data.samples.len());
            let points = Self::project(data, &mapper, &mut output.errors);
            match points.as_slice() {
                [] => continue,
                [point] => output.draw_list.push(self.marker(*point, data.color)),
                _ => output.draw_list.push(DrawCommand::Path {
                    path: Self::smooth_path(&points),
                    stroke: Some(Stroke::solid(self.style.line_width, data.color)),
                    fill: None,
                }),
            }
            drawn.push(data);
        }

        if !drawn.is_empty() {
            self.push_legend(&mut output.draw_list, &drawn, frame);
        }
    }

    fn marker(&self, center: Point, color: Rgba) -> DrawCommand {
        DrawCommand::Marker {
            center,
            radius: self.style.marker_radius,
            fill: color,
            stroke: None,
        }
    }

    fn push_threshold(&self, list: &mut DrawList, threshold: Threshold, mapper: &CoordinateMapper) {
        let (top_left, bottom_right) = mapper.plot_rect();
        let clamp_y = |y: f32| y.clamp(top_left.y, bottom_right.y);

        let band_top = clamp_y(mapper.y(threshold.upper()));
        let band_bottom = clamp_y(mapper.y(threshold.lower()));
        if band_bottom > band_top {
            list.push(DrawCommand::Rect {
                min: Point::new(top_left.x, band_top),
                max: Point::new(bottom_right.x, band_bottom),
                fill: Some(self.style.threshold_color.fade(self.style.band_alpha)),
                stroke: None,
            });
        }

        let target = mapper.y(threshold.target);
        if (top_left.y..=bottom_right.y).contains(&target) {
            list.push(DrawCommand::Line {
                from: Point::new(top_left.x, target),
                to: Point::new(bottom_right.x, target),
                stroke: Stroke::dashed(1.0, self.style.threshold_color, self.style.threshold_dash),
            });
        }
    }

    fn push_legend(&self, list: &mut DrawList, series: &[&SeriesData<'_>], frame: &PlotFrame) {
        let size = self.style.legend_text_size;
        let swatch = size * 0.8;
        let y = (frame.padding.top / 2.0).max(size / 2.0);
        let mut x = frame.padding.left + 4.0;

        for data in series {
            list.push(DrawCommand::Rect {
                min: Point::new(x, y - swatch / 2.0),
                max: Point::new(x + swatch, y + swatch / 2.0),
                fill: Some(data.color),
                stroke: None,
            });
            x += swatch + 4.0;
            list.push(DrawCommand::Text {
                position: Point::new(x, y),
                text: data.label.to_string(),
                color: self.style.legend_text_color,
                size,
                anchor: TextAnchor::Start,
            });
            // rough advance, hosts use proportional fonts
            x += data.label.chars().count() as f32 * size * 0.6 + 12.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw_list::eval_cubic;
    use chrono::{TimeZone, Utc};
    use rt_core::{Padding, YDomain};

    fn samples(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(), *v))
            .collect()
    }

    fn frame() -> PlotFrame {
        PlotFrame::new(400.0, 200.0, Padding::default(), YDomain { min: 0.0, max: 20.0 })
    }

    fn data<'a>(key: &'a SeriesKey, samples: &'a [Sample]) -> SeriesData<'a> {
        SeriesData {
            key,
            label: "gap",
            samples,
            index_offset: 0,
            color: Rgba::default(),
            threshold: None,
        }
    }

    fn paths(list: &DrawList) -> Vec<&Path> {
        list.commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Path { path, stroke: Some(_), .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_curve_passes_through_points() {
        let key = SeriesKey::new("refiner-1", "gap");
        let samples = samples(&[3.0, 9.0, 4.0, 15.0, 15.0, 1.0]);
        let output = CurveRenderer::default().render(&Chart::Single(data(&key, &samples)), &frame());

        let mapper = frame().mapper(samples.len());
        let expected: Vec<Point> = samples
            .iter()
            .enumerate()
            .map(|(i, s)| mapper.point(i, s.value))
            .collect();

        let stroked = paths(&output.draw_list);
        assert_eq!(stroked.len(), 1);
        assert_eq!(stroked[0].anchors(), expected);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_segments_do_not_overshoot() {
        let points = [
            Point::new(0.0, 100.0),
            Point::new(10.0, 20.0),
            Point::new(25.0, 80.0),
            Point::new(40.0, 79.0),
        ];
        let path = CurveRenderer::smooth_path(&points);
        for segment in path.cubic_segments() {
            let (lo, hi) = (segment[0].y.min(segment[3].y), segment[0].y.max(segment[3].y));
            for step in 0..=20 {
                let p = eval_cubic(&segment, step as f32 / 20.0);
                assert!(p.y >= lo - 1e-4 && p.y <= hi + 1e-4);
                assert!(p.x >= segment[0].x - 1e-4 && p.x <= segment[3].x + 1e-4);
            }
        }
    }

    #[test]
    fn test_control_points_at_one_third() {
        let path = CurveRenderer::smooth_path(&[Point::new(0.0, 5.0), Point::new(30.0, 50.0)]);
        let segments = path.cubic_segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0][1], Point::new(10.0, 5.0));
        assert_eq!(segments[0][2], Point::new(20.0, 50.0));
    }

    #[test]
    fn test_empty_and_single_point() {
        let key = SeriesKey::new("refiner-1", "gap");
        let renderer = CurveRenderer::default();

        let none: Vec<Sample> = Vec::new();
        let output = renderer.render(&Chart::Single(data(&key, &none)), &frame());
        assert!(output.draw_list.is_empty());

        let one = samples(&[7.0]);
        let output = renderer.render(&Chart::Single(data(&key, &one)), &frame());
        assert_eq!(output.draw_list.len(), 1);
        assert!(matches!(output.draw_list.commands()[0], DrawCommand::Marker { .. }));
    }

    #[test]
    fn test_non_finite_sample_is_reported_and_skipped() {
        let key = SeriesKey::new("refiner-1", "gap");
        let samples = samples(&[1.0, f64::NAN, 3.0, 4.0]);
        let mut series = data(&key, &samples);
        series.index_offset = 40;

        let output = CurveRenderer::default().render(&Chart::Single(series), &frame());
        assert_eq!(
            output.errors,
            vec![DataError {
                series_key: key.clone(),
                index: 41
            }]
        );
        let stroked = paths(&output.draw_list);
        assert_eq!(stroked[0].anchors().len(), 3);
    }

    #[test]
    fn test_single_draws_band_fill_and_dashed_target() {
        let key = SeriesKey::new("refiner-1", "gap");
        let samples = samples(&[8.0, 10.0, 12.0]);
        let mut series = data(&key, &samples);
        series.threshold = Some(Threshold::new(10.0, 2.0));

        let output = CurveRenderer::default().render(&Chart::Single(series), &frame());
        let commands = output.draw_list.commands();
        assert!(matches!(commands[0], DrawCommand::Rect { .. }));
        assert!(matches!(
            commands[1],
            DrawCommand::Line { stroke: Stroke { dash: Some(_), .. }, .. }
        ));
        assert!(matches!(
            commands[2],
            DrawCommand::Path { fill: Some(Fill::VerticalGradient { .. }), stroke: None, .. }
        ));
        assert!(matches!(commands[3], DrawCommand::Path { stroke: Some(_), fill: None, .. }));
    }

    #[test]
    fn test_multi_has_no_fill_and_a_legend() {
        let a = SeriesKey::new("refiner-1", "gap");
        let b = SeriesKey::new("refiner-2", "gap");
        let sa = samples(&[1.0, 2.0, 3.0]);
        let sb = samples(&[3.0, 2.0, 1.0]);
        let mut second = data(&b, &sb);
        second.label = "line 2";
        second.color = Rgba::from_rgb(250, 100, 150);

        let output = CurveRenderer::default().render(&Chart::Multi(vec![data(&a, &sa), second]), &frame());
        let commands = output.draw_list.commands();

        assert!(commands
            .iter()
            .all(|c| !matches!(c, DrawCommand::Path { fill: Some(_), .. })));
        assert_eq!(paths(&output.draw_list).len(), 2);
        let labels: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["gap", "line 2"]);
    }
}
