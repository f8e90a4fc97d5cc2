//! Rendering abstraction layer
//!
//! This crate turns visible samples into a declarative [`DrawList`] in pixel
//! space. It has no dependency on a drawing API: hosts implement
//! [`Renderer`] and replay the list onto SVG, a canvas or an immediate-mode UI.

pub mod axis;
pub mod curve;
pub mod draw_list;
pub mod mapper;

pub use axis::{AxisRenderer, AxisStyle};
pub use curve::{Chart, CurveOutput, CurveRenderer, CurveStyle, SeriesData};
pub use draw_list::{Dash, DrawCommand, DrawList, Fill, Path, PathCommand, Point, Stroke, TextAnchor};
pub use mapper::{CoordinateMapper, PlotFrame};
pub use rt_core::{Padding, YDomain};

use rt_core::Rgba;

/// Trait for host renderers
pub trait Renderer {
    /// Begin a new frame
    fn begin_frame(&mut self);

    /// End the current frame
    fn end_frame(&mut self);

    /// Draw a path, stroked and/or filled
    fn draw_path(&mut self, path: &Path, stroke: Option<&Stroke>, fill: Option<&Fill>);

    /// Draw a straight line
    fn draw_line(&mut self, from: Point, to: Point, stroke: &Stroke);

    /// Draw a rectangle
    fn draw_rect(&mut self, min: Point, max: Point, fill: Option<Rgba>, stroke: Option<&Stroke>);

    /// Draw a point marker
    fn draw_marker(&mut self, center: Point, radius: f32, fill: Rgba, stroke: Option<&Stroke>);

    /// Draw text
    fn draw_text(&mut self, text: &str, position: Point, color: Rgba, size: f32, anchor: TextAnchor);
}
