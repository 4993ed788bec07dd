//! Light theme for the application table.

use eframe::{egui, epaint};

/// Apply the App Center light theme to the current egui Context.
pub fn set_catalog_style(ctx: &egui::Context) {
    use egui::Visuals;

    let mut visuals = Visuals::light();
    visuals.panel_fill = epaint::Color32::from_rgb(250, 250, 251);
    visuals.extreme_bg_color = epaint::Color32::from_rgb(240, 240, 242);
    visuals.selection.bg_fill = epaint::Color32::from_rgb(0, 102, 204);
    visuals.widgets.noninteractive.bg_stroke =
        epaint::Stroke::new(1.0, epaint::Color32::from_rgb(226, 228, 232));
    visuals.widgets.hovered.bg_fill = epaint::Color32::from_rgb(236, 240, 246);
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(10.0, 4.0);
    ctx.set_style(style);
}
