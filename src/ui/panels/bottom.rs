use crate::types::ApplicationCollection;
use eframe::egui;
use eframe::epaint::Color32;

/// Status bar line: catalog counts, running operations and the latest message.
pub fn status_line(collection: &ApplicationCollection, busy_rows: usize, status_msgs: &[String]) -> String {
    let total = collection.len();
    let installed = collection.installed_count();
    let mut line = format!(
        "Applications: {}  •  Installed: {}  •  Available: {}",
        total,
        installed,
        total - installed
    );
    if busy_rows > 0 {
        line.push_str(&format!("  •  Running: {busy_rows}"));
    }
    if let Some(last) = status_msgs.last() {
        line.push_str("  •  ");
        line.push_str(last);
    }
    line
}

/// Render the bottom status bar.
pub fn show(ctx: &egui::Context, collection: &ApplicationCollection, busy_rows: usize, status_msgs: &[String]) {
    egui::TopBottomPanel::bottom("bottom_status")
        .resizable(false)
        .show(ctx, |ui| {
            let line = status_line(collection, busy_rows, status_msgs);
            let is_error = status_msgs.last().is_some_and(|m| m.starts_with("Error:"));
            let color = if is_error {
                Color32::from_rgb(163, 28, 28)
            } else {
                Color32::from_rgb(110, 112, 124)
            };

            ui.horizontal(|ui| {
                ui.set_height(28.0);
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new(line).color(color).monospace())
                        .on_hover_ui(|ui| {
                            for msg in status_msgs.iter().rev().take(10) {
                                ui.label(msg);
                            }
                        });
                });
            });
        });
}
