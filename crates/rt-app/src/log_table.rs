//! Linked operation log list

use egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};
use rt_core::{LogEntry, LogId, LogSource};
use rt_views::AnalysisSession;

use crate::theme;

fn source_label(source: LogSource) -> &'static str {
    match source {
        LogSource::Manual => "manual",
        LogSource::Automatic => "automatic",
    }
}

/// Log entry the table should emphasize: the selection wins over hover
fn emphasized(selected: Option<LogId>, hovered: Option<&LogEntry>) -> Option<LogId> {
    selected.or_else(|| hovered.map(|entry| entry.id))
}

/// Show the operation log; clicking a row selects it, clicking again clears
pub fn show(ui: &mut Ui, session: &AnalysisSession) {
    let logs = session.logs();
    let selected = session.selected_log();
    let hovered = session.hovered_log();
    let highlight = emphasized(selected, hovered.as_ref());

    if logs.is_empty() {
        ui.weak("No operation log entries in range");
        return;
    }

    let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 1.5;
    let mut clicked = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(60.0).at_least(40.0))
        .column(Column::initial(90.0).at_least(60.0))
        .column(Column::initial(80.0).at_least(60.0))
        .column(Column::initial(140.0).at_least(100.0))
        .column(Column::initial(80.0).at_least(60.0))
        .column(Column::initial(80.0).at_least(60.0))
        .column(Column::remainder().at_least(70.0))
        .min_scrolled_height(0.0)
        .vscroll(true)
        .header(20.0, |mut header| {
            for title in ["Id", "Device", "Action", "Start", "Duration", "Delta", "Source"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(text_height, logs.len(), |row_index, mut row| {
                let entry = &logs[row_index];
                let is_highlighted = highlight == Some(entry.id);

                row.col(|ui| {
                    if ui
                        .selectable_label(is_highlighted, entry.id.to_string())
                        .clicked()
                    {
                        clicked = Some(entry.id);
                    }
                });
                row.col(|ui| {
                    ui.label(&entry.device_id);
                });
                row.col(|ui| {
                    ui.label(
                        RichText::new(entry.action.to_string()).color(theme::action(entry.action)),
                    );
                });
                row.col(|ui| {
                    ui.label(entry.start_time.format("%Y-%m-%d %H:%M:%S").to_string());
                });
                row.col(|ui| {
                    ui.label(format!("{:.0} s", entry.duration_seconds));
                });
                row.col(|ui| {
                    ui.label(format!("{:+.3}", entry.value_delta));
                });
                row.col(|ui| {
                    ui.label(source_label(entry.source));
                });
            });
        });

    if let Some(id) = clicked {
        if selected == Some(id) {
            session.select_log(None);
        } else {
            session.select_log(Some(id));
        }
    }
}
