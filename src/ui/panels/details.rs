use crate::core::resolve_icon_url;
use crate::types::ApplicationEntry;
use eframe::egui;
use std::path::PathBuf;

/// What the user asked for in the details panel this frame.
#[derive(Debug, PartialEq, Eq)]
pub enum DetailsAction {
    None,
    Close,
    Launch,
}

/// Render the right-hand details panel for the navigated entry.
pub fn show(
    ctx: &egui::Context,
    id: &str,
    entry: Option<&ApplicationEntry>,
    icon_dirs: &[PathBuf],
) -> DetailsAction {
    let mut action = DetailsAction::None;
    egui::SidePanel::right("details")
        .resizable(false)
        .exact_width(320.0)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("DETAILS").strong().size(14.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✖").on_hover_text("Close").clicked() {
                        action = DetailsAction::Close;
                    }
                });
            });
            ui.separator();

            let Some(entry) = entry else {
                ui.centered_and_justified(|ui| {
                    ui.label(format!("Application {id} is no longer available."));
                });
                return;
            };

            ui.heading(egui::RichText::new(&entry.name).strong().size(20.0));
            if !entry.summary.is_empty() {
                ui.label(&entry.summary);
            }
            ui.add_space(6.0);

            egui::Grid::new("details_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.weak("ID");
                    ui.label(&entry.id);
                    ui.end_row();
                    ui.weak("Package");
                    ui.label(&entry.pkgname);
                    ui.end_row();
                    ui.weak("File");
                    ui.label(entry.file.display().to_string());
                    ui.end_row();
                    ui.weak("Icon");
                    ui.label(resolve_icon_url(entry.icon.as_deref(), icon_dirs));
                    ui.end_row();
                    ui.weak("Status");
                    if entry.installed {
                        ui.colored_label(egui::Color32::from_rgb(30, 130, 60), "Installed");
                    } else {
                        ui.label("Not installed");
                    }
                    ui.end_row();
                });

            if entry.installed {
                ui.add_space(8.0);
                if ui.button("▶ Launch").clicked() {
                    action = DetailsAction::Launch;
                }
            }
        });
    action
}
