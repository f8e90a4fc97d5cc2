//! Data-to-pixel coordinate mapping

use rt_core::{Padding, YDomain};

use crate::draw_list::Point;

/// Canvas geometry and value domain shared by every curve of a pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotFrame {
    pub width: f32,
    pub height: f32,
    pub padding: Padding,
    pub y_domain: YDomain,
}

impl PlotFrame {
    pub fn new(width: f32, height: f32, padding: Padding, y_domain: YDomain) -> Self {
        Self {
            width,
            height,
            padding,
            y_domain,
        }
    }

    /// Mapper for a visible slice of `total` samples
    pub fn mapper(&self, total: usize) -> CoordinateMapper {
        CoordinateMapper {
            frame: *self,
            total,
        }
    }
}

/// Maps visible-slice indices and values to pixels and back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    frame: PlotFrame,
    total: usize,
}

impl CoordinateMapper {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn frame(&self) -> &PlotFrame {
        &self.frame
    }

    fn draw_width(&self) -> f64 {
        let p = &self.frame.padding;
        f64::from(self.frame.width) - f64::from(p.left) - f64::from(p.right)
    }

    fn draw_height(&self) -> f64 {
        let p = &self.frame.padding;
        f64::from(self.frame.height) - f64::from(p.top) - f64::from(p.bottom)
    }

    fn value_range(&self) -> f64 {
        let range = self.frame.y_domain.range();
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    /// Horizontal pixel of the local index `i`
    pub fn x(&self, i: usize) -> f32 {
        let left = f64::from(self.frame.padding.left);
        let offset = if self.total <= 1 {
            self.draw_width() / 2.0
        } else {
            i as f64 / (self.total - 1) as f64 * self.draw_width()
        };
        (left + offset) as f32
    }

    /// Vertical pixel of `value`
    pub fn y(&self, value: f64) -> f32 {
        let top = f64::from(self.frame.padding.top);
        let h = self.draw_height();
        let t = (value - self.frame.y_domain.min) / self.value_range();
        (top + h - t * h) as f32
    }

    pub fn point(&self, i: usize, value: f64) -> Point {
        Point::new(self.x(i), self.y(value))
    }

    /// Fraction of the plot width under `px`, clamped to [0, 1]
    pub fn inverse_x(&self, px: f32) -> f64 {
        let w = self.draw_width();
        if w <= 0.0 {
            return 0.0;
        }
        ((f64::from(px) - f64::from(self.frame.padding.left)) / w).clamp(0.0, 1.0)
    }

    /// Local index nearest to `px`
    pub fn nearest_index(&self, px: f32) -> Option<usize> {
        match self.total {
            0 => None,
            1 => Some(0),
            n => Some((self.inverse_x(px) * (n - 1) as f64).round() as usize),
        }
    }

    /// Value under the pixel row `py`
    pub fn inverse_y(&self, py: f32) -> f64 {
        let h = self.draw_height();
        if h <= 0.0 {
            return self.frame.y_domain.min;
        }
        let top = f64::from(self.frame.padding.top);
        let t = (top + h - f64::from(py)) / h;
        self.frame.y_domain.min + t * self.value_range()
    }

    /// Top-left and bottom-right corners of the plot area
    pub fn plot_rect(&self) -> (Point, Point) {
        let p = &self.frame.padding;
        (
            Point::new(p.left, p.top),
            Point::new(self.frame.width - p.right, self.frame.height - p.bottom),
        )
    }

    /// Pixel row of the bottom edge of the plot area
    pub fn baseline(&self) -> f32 {
        self.frame.height - self.frame.padding.bottom
    }
}
