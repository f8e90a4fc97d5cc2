//! Declarative drawing primitives
//!
//! Commands are listed in paint order: later commands draw on top.

use rt_core::Rgba;

use crate::Renderer;

/// A position in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One step of a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

/// A sequence of path commands
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, point: Point) {
        self.commands.push(PathCommand::MoveTo(point));
    }

    pub fn line_to(&mut self, point: Point) {
        self.commands.push(PathCommand::LineTo(point));
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.commands.push(PathCommand::CubicTo { c1, c2, to });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// End points of every command, in order
    pub fn anchors(&self) -> Vec<Point> {
        self.commands
            .iter()
            .filter_map(|command| match *command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
                PathCommand::CubicTo { to, .. } => Some(to),
                PathCommand::Close => None,
            })
            .collect()
    }

    /// Cubic segments as `[start, c1, c2, end]`
    pub fn cubic_segments(&self) -> Vec<[Point; 4]> {
        let mut segments = Vec::new();
        let mut current = None;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => current = Some(p),
                PathCommand::CubicTo { c1, c2, to } => {
                    if let Some(from) = current {
                        segments.push([from, c1, c2, to]);
                    }
                    current = Some(to);
                }
                PathCommand::Close => {}
            }
        }
        segments
    }
}

/// Evaluate a cubic Bezier segment at `t` in [0, 1]
pub fn eval_cubic(segment: &[Point; 4], t: f32) -> Point {
    let u = 1.0 - t;
    let [p0, p1, p2, p3] = *segment;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * t;
    let w2 = 3.0 * u * t * t;
    let w3 = t * t * t;
    Point::new(
        w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
        w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
    )
}

/// Dash pattern, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
}

/// Line appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgba,
    pub dash: Option<Dash>,
}

impl Stroke {
    pub fn solid(width: f32, color: Rgba) -> Self {
        Self {
            width,
            color,
            dash: None,
        }
    }

    pub fn dashed(width: f32, color: Rgba, dash: Dash) -> Self {
        Self {
            width,
            color,
            dash: Some(dash),
        }
    }
}

/// Area appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    /// Colour fades linearly from `top` to `bottom` (pixel rows)
    VerticalGradient {
        top: f32,
        bottom: f32,
        top_color: Rgba,
        bottom_color: Rgba,
    },
}

/// Horizontal alignment of a text label relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// A single drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Path {
        path: Path,
        stroke: Option<Stroke>,
        fill: Option<Fill>,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Rect {
        min: Point,
        max: Point,
        fill: Option<Rgba>,
        stroke: Option<Stroke>,
    },
    Marker {
        center: Point,
        radius: f32,
        fill: Rgba,
        stroke: Option<Stroke>,
    },
    Text {
        position: Point,
        text: String,
        color: Rgba,
        size: f32,
        anchor: TextAnchor,
    },
}

/// Ordered list of drawing instructions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Append another list on top of this one
    pub fn extend(&mut self, other: DrawList) {
        self.commands.extend(other.commands);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Feed every command to a host renderer, in paint order
    pub fn replay(&self, renderer: &mut dyn Renderer) {
        renderer.begin_frame();
        for command in &self.commands {
            match command {
                DrawCommand::Path { path, stroke, fill } => {
                    renderer.draw_path(path, stroke.as_ref(), fill.as_ref())
                }
                DrawCommand::Line { from, to, stroke } => renderer.draw_line(*from, *to, stroke),
                DrawCommand::Rect {
                    min,
                    max,
                    fill,
                    stroke,
                } => renderer.draw_rect(*min, *max, *fill, stroke.as_ref()),
                DrawCommand::Marker {
                    center,
                    radius,
                    fill,
                    stroke,
                } => renderer.draw_marker(*center, *radius, *fill, stroke.as_ref()),
                DrawCommand::Text {
                    position,
                    text,
                    color,
                    size,
                    anchor,
                } => renderer.draw_text(text, *position, *color, *size, *anchor),
            }
        }
        renderer.end_frame();
    }
}
