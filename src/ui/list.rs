//! The application table: ordering, empty-state placeholder, the list-wide
//! metadata refresh and one `RowController` per entry.

use std::cmp::Ordering;
use std::collections::HashMap;

use egui::{Align, Button, Layout, RichText, ScrollArea, Ui, Vec2};
use icu_collator::{Collator, CollatorOptions, Strength};
use tracing::{debug, info, warn};

use crate::config::AppsConfig;
use crate::operation::{OperationHandle, PackageBackend};
use crate::shell::Shell;
use crate::types::{ApplicationCollection, ApplicationEntry, ProgressData};

use super::row::{RowContext, RowController, progress_bar, report_settlement};

pub const REFRESH_TITLE: &str = "Checking for new applications";
pub const NO_APPLICATIONS: &str = "No applications installed or available";

pub enum ListViewState {
    Idle,
    Refreshing {
        progress: Option<ProgressData>,
        operation: OperationHandle,
    },
}

/// What to show instead of rows when the ordered sequence is empty.
#[derive(Debug, PartialEq, Eq)]
pub enum Placeholder {
    Loading,
    NoApplications,
}

thread_local! {
    static NAME_COLLATOR: Option<Collator> = name_collator();
}

/// Root-locale collator: accents and case only break ties, lowercase first.
fn name_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(&Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            warn!("name collation unavailable, sorting by folded case: {e}");
            None
        }
    }
}

/// Locale-aware name ordering: letters compare by base character first, so
/// "Émile" sorts among the E names, and lowercase precedes uppercase when
/// names differ only in case.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    NAME_COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| b.cmp(a)),
    })
}

/// Entries ordered by name; equal names keep collection order.
pub fn ordered_entries(collection: &ApplicationCollection) -> Vec<&ApplicationEntry> {
    let mut entries: Vec<&ApplicationEntry> = collection.entries().collect();
    entries.sort_by(|a, b| compare_names(&a.name, &b.name));
    entries
}

pub fn placeholder(collection: &ApplicationCollection) -> Option<Placeholder> {
    if !collection.is_empty() {
        None
    } else if collection.ready {
        Some(Placeholder::NoApplications)
    } else {
        Some(Placeholder::Loading)
    }
}

pub struct ListController {
    state: ListViewState,
    rows: HashMap<String, RowController>,
}

impl Default for ListController {
    fn default() -> Self {
        Self {
            state: ListViewState::Idle,
            rows: HashMap::new(),
        }
    }
}

impl ListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ListViewState {
        &self.state
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.state, ListViewState::Refreshing { .. })
    }

    pub fn row(&self, id: &str) -> Option<&RowController> {
        self.rows.get(id)
    }

    pub fn busy_rows(&self) -> usize {
        self.rows.values().filter(|r| r.is_busy()).count()
    }

    /// Mount rows for new entries and drop rows whose entry is gone.
    pub fn sync_rows(&mut self, collection: &ApplicationCollection) {
        self.rows.retain(|id, _| collection.contains(id));
        for entry in collection.entries() {
            if !self.rows.contains_key(&entry.id) {
                self.rows.insert(entry.id.clone(), RowController::new());
            }
        }
    }

    /// Start refreshing the application metadata.
    pub fn on_refresh_press(
        &mut self,
        collection: &ApplicationCollection,
        config: &AppsConfig,
        backend: &dyn PackageBackend,
    ) {
        if self.is_refreshing() {
            debug!("refresh already running, ignoring press");
            return;
        }
        info!(origins = collection.origin_files.len(), "refreshing application list");
        let operation = backend.refresh(
            &collection.origin_files,
            &config.appstream_config_packages,
            &config.appstream_data_packages,
        );
        self.state = ListViewState::Refreshing {
            progress: None,
            operation,
        };
    }

    pub fn on_cancel_press(&self) {
        if let ListViewState::Refreshing {
            progress: Some(ProgressData {
                cancel: Some(cancel),
                ..
            }),
            ..
        } = &self.state
        {
            cancel.request();
        }
    }

    /// Apply pending events of the refresh and every row. Returns true when
    /// any operation settled successfully.
    pub fn pump(&mut self, shell: &mut dyn Shell) -> bool {
        let mut succeeded = false;

        if let ListViewState::Refreshing {
            progress,
            operation,
        } = &mut self.state
        {
            if let Some(result) = operation.drain(progress) {
                // the list keeps no error of its own; the shell shows it
                report_settlement(&result, shell);
                succeeded |= result.is_ok();
                self.state = ListViewState::Idle;
            }
        }

        for row in self.rows.values_mut() {
            if let Some(result) = row.pump(shell) {
                succeeded |= result.is_ok();
            }
        }
        succeeded
    }

    pub fn show(
        &mut self,
        ui: &mut Ui,
        collection: &ApplicationCollection,
        config: &AppsConfig,
        ctx: &mut RowContext<'_>,
    ) {
        self.sync_rows(collection);

        let mut refresh_clicked = false;
        let mut cancel_clicked = false;
        ui.horizontal(|ui| {
            ui.set_height(32.0);
            ui.heading("Applications");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| match &self.state {
                ListViewState::Refreshing { progress, .. } => {
                    let cancellable = progress.as_ref().is_some_and(|p| p.cancel.is_some());
                    if ui.add_enabled(cancellable, Button::new("Cancel")).clicked() {
                        cancel_clicked = true;
                    }
                    ui.allocate_ui(Vec2::new(260.0, 24.0), |ui| {
                        progress_bar(ui, REFRESH_TITLE, progress.as_ref());
                    });
                }
                ListViewState::Idle => {
                    if ui
                        .button("🔄")
                        .on_hover_text("Update package information")
                        .clicked()
                    {
                        refresh_clicked = true;
                    }
                }
            });
        });
        ui.separator();

        if refresh_clicked {
            self.on_refresh_press(collection, config, ctx.backend);
        }
        if cancel_clicked {
            self.on_cancel_press();
        }

        let entries = ordered_entries(collection);
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(empty) = placeholder(collection) {
                    ui.add_space(12.0);
                    ui.vertical_centered(|ui| match empty {
                        Placeholder::Loading => {
                            ui.spinner();
                        }
                        Placeholder::NoApplications => {
                            ui.label(RichText::new(NO_APPLICATIONS).italics());
                        }
                    });
                    return;
                }
                for entry in entries {
                    let row = self.rows.entry(entry.id.clone()).or_default();
                    row.show(ui, entry, ctx);
                }
            });
    }
}
