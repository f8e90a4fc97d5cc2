//! Range selector for the shared time window

use egui::{Align2, FontId, Rect, Sense, Stroke, Ui};
use rt_core::{DragHandle, DragMode, TimeRange, TimeWindow};

use crate::theme;

const BAR_HEIGHT: f32 = 22.0;
const HANDLE_WIDTH: f32 = 6.0;
/// Zoom factor of one button press
const ZOOM_STEP: f64 = 0.8;
/// Pan distance of one button press, in window widths
const PAN_STEP: f64 = 0.25;

fn pct_of(rect: Rect, x: f32) -> f64 {
    if rect.width() <= 0.0 {
        return 0.0;
    }
    (((x - rect.left()) / rect.width()) as f64 * 100.0).clamp(0.0, 100.0)
}

fn x_of(rect: Rect, pct: f64) -> f32 {
    rect.left() + rect.width() * (pct / 100.0) as f32
}

/// Handle closest to the pointer; ties go to the end handle
fn nearest_handle(start_pct: f64, end_pct: f64, pointer_pct: f64) -> DragHandle {
    if (pointer_pct - start_pct).abs() < (pointer_pct - end_pct).abs() {
        DragHandle::Start
    } else {
        DragHandle::End
    }
}

/// Draws the window selector and forwards edge drags and button presses
pub fn show(ui: &mut Ui, window: &TimeWindow, range: &TimeRange) {
    let viewport = window.viewport();
    let format = if range.duration().num_hours() >= 24 {
        "%m-%d %H:%M"
    } else {
        "%H:%M:%S"
    };

    ui.horizontal(|ui| {
        if ui.button("−").on_hover_text("Zoom out").clicked() {
            window.zoom(1.0 / ZOOM_STEP, (viewport.start() + viewport.end()) / 2.0);
        }
        if ui.button("+").on_hover_text("Zoom in").clicked() {
            window.zoom(ZOOM_STEP, (viewport.start() + viewport.end()) / 2.0);
        }
        if ui.button("◀").on_hover_text("Pan left").clicked() {
            window.pan_by(-viewport.width() * PAN_STEP);
        }
        if ui.button("▶").on_hover_text("Pan right").clicked() {
            window.pan_by(viewport.width() * PAN_STEP);
        }
        if ui.button("Reset").clicked() {
            window.reset();
        }
        ui.separator();
        ui.label(format!(
            "{}  →  {}",
            range.at_percent(viewport.start()).format(format),
            range.at_percent(viewport.end()).format(format)
        ));
    });

    let width = ui.available_width();
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(width, BAR_HEIGHT), Sense::click_and_drag());

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            let handle = nearest_handle(viewport.start(), viewport.end(), pct_of(rect, pos.x));
            window.begin_drag(handle);
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            window.update_drag(pct_of(rect, pos.x));
        }
    }
    if response.drag_released() {
        window.end_drag();
    }

    let viewport = window.viewport();
    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();
    painter.rect_filled(rect, 3.0, visuals.extreme_bg_color);

    let selected = Rect::from_x_y_ranges(
        x_of(rect, viewport.start())..=x_of(rect, viewport.end()),
        rect.y_range(),
    );
    painter.rect(
        selected,
        3.0,
        theme::accent().linear_multiply(0.25),
        Stroke::new(1.0, theme::accent()),
    );

    let active = match window.drag_mode() {
        DragMode::Dragging(handle) => Some(handle),
        DragMode::Idle => None,
    };
    for (handle, x) in [
        (DragHandle::Start, selected.left()),
        (DragHandle::End, selected.right()),
    ] {
        let color = if active == Some(handle) {
            visuals.strong_text_color()
        } else {
            theme::accent()
        };
        let grip = Rect::from_center_size(
            egui::pos2(x, rect.center().y),
            egui::vec2(HANDLE_WIDTH, rect.height() - 4.0),
        );
        painter.rect_filled(grip, 2.0, color);
    }

    painter.text(
        rect.left_center() + egui::vec2(6.0, 0.0),
        Align2::LEFT_CENTER,
        range.start.format(format).to_string(),
        FontId::proportional(10.0),
        visuals.weak_text_color(),
    );
    painter.text(
        rect.right_center() - egui::vec2(6.0, 0.0),
        Align2::RIGHT_CENTER,
        range.end.format(format).to_string(),
        FontId::proportional(10.0),
        visuals.weak_text_color(),
    );
}
