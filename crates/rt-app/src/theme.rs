//! egui side of the chart palette

use egui::{Color32, Context, Stroke, Visuals};
use rt_core::ActionType;
use rt_views::palette;

use crate::painter::color32;

/// Dark visuals whose canvas and selection colours match the chart panes
pub fn apply_theme(ctx: &Context) {
    let mut visuals = Visuals::dark();
    // range bar track and table background
    visuals.extreme_bg_color = canvas();
    // selected log rows
    visuals.selection.bg_fill = color32(palette::ACCENT.fade(0.3));
    visuals.selection.stroke = Stroke::new(1.0, accent());
    ctx.set_visuals(visuals);
}

pub fn canvas() -> Color32 {
    color32(palette::CANVAS)
}

pub fn border() -> Color32 {
    color32(palette::BORDER)
}

pub fn accent() -> Color32 {
    color32(palette::ACCENT)
}

pub fn warning() -> Color32 {
    color32(palette::WARNING)
}

pub fn error() -> Color32 {
    color32(palette::RETRACT)
}

/// Same colour as the action's correlation band
pub fn action(action: ActionType) -> Color32 {
    match action {
        ActionType::Advance => color32(palette::ADVANCE),
        ActionType::Retract => color32(palette::RETRACT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_colours_follow_the_chart_palette() {
        assert_eq!(action(ActionType::Advance), Color32::from_rgb(80, 200, 120));
        assert_eq!(action(ActionType::Retract), error());
    }
}
