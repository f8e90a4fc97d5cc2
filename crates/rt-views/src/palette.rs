//! Colours shared by the chart panes and the host widgets

use rt_core::Rgba;

pub const CANVAS: Rgba = Rgba::from_rgb(23, 23, 23);
pub const BORDER: Rgba = Rgba::from_rgb(50, 50, 50);
pub const TEXT: Rgba = Rgba::from_rgb(220, 220, 220);
pub const MUTED_TEXT: Rgba = Rgba::from_rgb(140, 140, 140);
pub const CROSSHAIR: Rgba = Rgba::from_rgb(200, 200, 200);
pub const ACCENT: Rgba = Rgba::from_rgb(100, 150, 250);
pub const WARNING: Rgba = Rgba::from_rgb(230, 180, 80);

/// Knife advance bands and log rows
pub const ADVANCE: Rgba = Rgba::from_rgb(80, 200, 120);
/// Knife retract bands, log rows and errors
pub const RETRACT: Rgba = Rgba::from_rgb(230, 90, 90);
