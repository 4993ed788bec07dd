mod backend;
mod config;
mod core;
mod error;
mod operation;
mod shell;
mod style;
mod types;
mod ui;

#[cfg(test)]
mod test_support;

use eframe::egui;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config::load_default() {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; falling back to default configuration");
            config::AppsConfig::default().expanded()
        }
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("App Center")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "App Center",
        native_options,
        Box::new(|_cc| Ok(Box::new(ui::AppCenter::new(config)))),
    )
}
