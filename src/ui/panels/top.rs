use eframe::egui;

/// Render the top header panel.
pub fn show(ctx: &egui::Context) {
    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.heading(format!("📦 App Center v{}", env!("CARGO_PKG_VERSION")));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.weak("Install and remove applications");
            });
        });
        ui.add_space(6.0);
    });
}
