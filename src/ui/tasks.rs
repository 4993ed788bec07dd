//! Background tasks used by the UI for (re)loading the application catalog
//! without blocking the UI thread.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use tracing::info;

use crate::core::load_catalog;
use crate::types::ApplicationCollection;

/// Message sent from the catalog loader to the UI.
pub enum CatalogUpdate {
    Loaded(ApplicationCollection),
    Failed(String),
}

/// Spawn a background task loading the catalog from `dirs`. The result
/// arrives on the returned receiver exactly once.
pub fn spawn_load_catalog(dirs: Vec<PathBuf>) -> mpsc::Receiver<CatalogUpdate> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        info!(dirs = dirs.len(), "loading application catalog");
        let update = match load_catalog(&dirs) {
            Ok(collection) => CatalogUpdate::Loaded(collection),
            Err(e) => CatalogUpdate::Failed(format!("Loading applications failed: {e:#}")),
        };
        let _ = tx.send(update);
    });
    rx
}
