//! egui backend for rt-render draw lists

use egui::epaint::{Mesh, Shape};
use egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Vec2};
use rt_core::Rgba;
use rt_render::draw_list::eval_cubic;
use rt_render::{Fill, Path, PathCommand, Point, Renderer, Stroke, TextAnchor};

/// Line segments used to flatten one cubic segment
const CUBIC_STEPS: usize = 12;

pub fn color32(c: Rgba) -> Color32 {
    let [r, g, b, a] = c.0;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn stroke(s: &Stroke) -> egui::Stroke {
    egui::Stroke::new(s.width, color32(s.color))
}

/// Paints draw lists with an egui painter, offset to the pane origin
pub struct EguiRenderer<'a> {
    painter: &'a Painter,
    origin: Vec2,
    shapes: usize,
}

impl<'a> EguiRenderer<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self {
            painter,
            origin: rect.min.to_vec2(),
            shapes: 0,
        }
    }

    fn pos(&self, p: Point) -> Pos2 {
        Pos2::new(p.x, p.y) + self.origin
    }

    /// Flatten a path into polylines, one per sub-path
    fn flatten(&self, path: &Path) -> Vec<Vec<Pos2>> {
        let mut lines: Vec<Vec<Pos2>> = Vec::new();
        let mut current: Vec<Pos2> = Vec::new();
        let mut last = None;

        for command in &path.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    if current.len() > 1 {
                        lines.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(self.pos(p));
                    last = Some(p);
                }
                PathCommand::LineTo(p) => {
                    current.push(self.pos(p));
                    last = Some(p);
                }
                PathCommand::CubicTo { c1, c2, to } => {
                    let from = last.unwrap_or(c1);
                    let segment = [from, c1, c2, to];
                    for step in 1..=CUBIC_STEPS {
                        let t = step as f32 / CUBIC_STEPS as f32;
                        current.push(self.pos(eval_cubic(&segment, t)));
                    }
                    last = Some(to);
                }
                PathCommand::Close => {
                    if let Some(first) = current.first().copied() {
                        current.push(first);
                    }
                }
            }
        }
        if current.len() > 1 {
            lines.push(current);
        }
        lines
    }

    /// Fill the area between a polyline and the row `bottom`
    fn fill_to_bottom(&mut self, points: &[Pos2], bottom: f32, fill: &Fill) {
        let shade = |y: f32| match *fill {
            Fill::Solid(c) => color32(c),
            Fill::VerticalGradient {
                top,
                bottom,
                top_color,
                bottom_color,
            } => {
                let (top, bottom) = (top + self.origin.y, bottom + self.origin.y);
                let t = if bottom > top {
                    ((y - top) / (bottom - top)).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                lerp_color(color32(top_color), color32(bottom_color), t)
            }
        };

        let mut mesh = Mesh::default();
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (b.x - a.x).abs() < f32::EPSILON {
                continue;
            }
            let base = mesh.vertices.len() as u32;
            mesh.colored_vertex(a, shade(a.y));
            mesh.colored_vertex(b, shade(b.y));
            mesh.colored_vertex(Pos2::new(b.x, bottom), shade(bottom));
            mesh.colored_vertex(Pos2::new(a.x, bottom), shade(bottom));
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        }
        self.painter.add(Shape::mesh(mesh));
        self.shapes += 1;
    }
}

fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    let [ar, ag, ab, aa] = a.to_srgba_unmultiplied();
    let [br, bg, bb, ba] = b.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(mix(ar, br), mix(ag, bg), mix(ab, bb), mix(aa, ba))
}

impl Renderer for EguiRenderer<'_> {
    fn begin_frame(&mut self) {
        self.shapes = 0;
    }

    fn end_frame(&mut self) {
        tracing::trace!(shapes = self.shapes, "pane painted");
    }

    fn draw_path(&mut self, path: &Path, stroke_style: Option<&Stroke>, fill: Option<&Fill>) {
        for line in self.flatten(path) {
            if let Some(fill) = fill {
                let bottom = line.iter().map(|p| p.y).fold(f32::MIN, f32::max);
                let curve_only: Vec<Pos2> = match path.commands.last() {
                    // drop the two baseline corners and the closing point
                    Some(PathCommand::Close) if line.len() > 3 => line[..line.len() - 3].to_vec(),
                    _ => line.clone(),
                };
                self.fill_to_bottom(&curve_only, bottom, fill);
            }
            if let Some(s) = stroke_style {
                match s.dash {
                    Some(dash) => {
                        self.painter
                            .extend(Shape::dashed_line(&line, stroke(s), dash.on, dash.off));
                    }
                    None => {
                        self.painter.add(Shape::line(line, stroke(s)));
                    }
                }
                self.shapes += 1;
            }
        }
    }

    fn draw_line(&mut self, from: Point, to: Point, s: &Stroke) {
        let points = [self.pos(from), self.pos(to)];
        match s.dash {
            Some(dash) => self
                .painter
                .extend(Shape::dashed_line(&points, stroke(s), dash.on, dash.off)),
            None => {
                self.painter.line_segment(points, stroke(s));
            }
        }
        self.shapes += 1;
    }

    fn draw_rect(&mut self, min: Point, max: Point, fill: Option<Rgba>, s: Option<&Stroke>) {
        let rect = Rect::from_two_pos(self.pos(min), self.pos(max));
        self.painter.rect(
            rect,
            0.0,
            fill.map(color32).unwrap_or(Color32::TRANSPARENT),
            s.map(stroke).unwrap_or(egui::Stroke::NONE),
        );
        self.shapes += 1;
    }

    fn draw_marker(&mut self, center: Point, radius: f32, fill: Rgba, s: Option<&Stroke>) {
        self.painter.circle(
            self.pos(center),
            radius,
            color32(fill),
            s.map(stroke).unwrap_or(egui::Stroke::NONE),
        );
        self.shapes += 1;
    }

    fn draw_text(&mut self, text: &str, position: Point, c: Rgba, size: f32, anchor: TextAnchor) {
        let align = match anchor {
            TextAnchor::Start => Align2::LEFT_CENTER,
            TextAnchor::Middle => Align2::CENTER_CENTER,
            TextAnchor::End => Align2::RIGHT_CENTER,
        };
        self.painter
            .text(self.pos(position), align, text, FontId::proportional(size), color32(c));
        self.shapes += 1;
    }
}
