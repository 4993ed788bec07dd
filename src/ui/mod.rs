//! Egui-based UI for the App Center.
//!
//! This module defines the application state, the eframe App implementation,
//! and wires catalog reloads and package operations into the list.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Duration;

use eframe::{App, egui};
use tracing::info;

use crate::backend::CommandBackend;
use crate::config::AppsConfig;
use crate::operation::PackageBackend;
use crate::shell::{DesktopShell, Shell};
use crate::style::set_catalog_style;
use crate::types::ApplicationCollection;

use self::list::ListController;
use self::panels::details::DetailsAction;
use self::row::RowContext;
use self::tasks::{CatalogUpdate, spawn_load_catalog};

pub mod list;
pub mod panels;
pub mod row;
pub mod tasks;

/// Main eframe application that renders and controls the UI.
pub struct AppCenter {
    config: AppsConfig,
    backend: Box<dyn PackageBackend>,
    shell: DesktopShell,
    collection: ApplicationCollection,
    list: ListController,
    catalog_rx: Option<mpsc::Receiver<CatalogUpdate>>,
    reload_pending: bool,
}

impl AppCenter {
    /// Start with an empty, not-ready collection and immediately load the
    /// catalog in the background.
    pub fn new(config: AppsConfig) -> Self {
        let backend = Box::new(CommandBackend::new(config.commands.clone()));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: AppsConfig, backend: Box<dyn PackageBackend>) -> Self {
        let shell = DesktopShell::new(config.commands.launch.clone());
        let mut app = Self {
            config,
            backend,
            shell,
            collection: ApplicationCollection::default(),
            list: ListController::new(),
            catalog_rx: None,
            reload_pending: false,
        };
        app.reload_catalog();
        app
    }

    /// Reload the catalog; a reload requested while one is running is
    /// queued behind it.
    fn reload_catalog(&mut self) {
        if self.catalog_rx.is_some() {
            self.reload_pending = true;
            return;
        }
        self.catalog_rx = Some(spawn_load_catalog(self.config.catalog_dirs.clone()));
    }

    /// Pull the catalog loader result (non-blocking).
    fn poll_catalog(&mut self) {
        let Some(rx) = &self.catalog_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(CatalogUpdate::Loaded(collection)) => {
                self.collection = collection;
                self.shell
                    .push_status(format!("{} applications loaded", self.collection.len()));
            }
            Ok(CatalogUpdate::Failed(msg)) => {
                self.shell.report_error(&msg);
                self.collection.ready = true;
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.shell.report_error("Catalog loader stopped unexpectedly");
                self.collection.ready = true;
            }
        }
        self.catalog_rx = None;
        if std::mem::take(&mut self.reload_pending) {
            self.reload_catalog();
        }
    }
}

/// Egui frame update: theme, operation events, catalog reloads and layout.
impl App for AppCenter {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        set_catalog_style(ctx);

        self.poll_catalog();
        if self.list.pump(&mut self.shell) {
            info!("package state changed, reloading catalog");
            self.reload_catalog();
        }

        panels::top::show(ctx);
        panels::bottom::show(ctx, &self.collection, self.list.busy_rows(), self.shell.status_msgs());

        if let Some(id) = self.shell.location().map(str::to_string) {
            let entry = self.collection.get(&id);
            match panels::details::show(ctx, &id, entry, &self.config.icon_dirs) {
                DetailsAction::None => {}
                DetailsAction::Close => self.shell.close_location(),
                DetailsAction::Launch => {
                    if let Some(entry) = entry {
                        self.shell.launch(entry);
                    }
                }
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            let mut row_ctx = RowContext {
                backend: self.backend.as_ref(),
                shell: &mut self.shell,
            };
            self.list
                .show(ui, &self.collection, &self.config, &mut row_ctx);
        });

        // keep polling operation channels while anything is in flight
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
