//! Core data types shared across the application.

use egui::Color32;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One listed application: catalog metadata plus install state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ApplicationEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Derived from `file` when the catalog is loaded.
    #[serde(skip)]
    pub installed: bool,
    pub pkgname: String,
    /// File owned by the package once installed; removal targets it.
    pub file: PathBuf,
    #[serde(default)]
    pub launchable: Option<String>,
}

/// Snapshot of the catalog handed down to the list every frame, keyed by id
/// in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ApplicationCollection {
    components: IndexMap<String, ApplicationEntry>,
    /// Whether the catalog finished loading at least once.
    pub ready: bool,
    pub origin_files: Vec<PathBuf>,
}

impl ApplicationCollection {
    /// Insert an entry, replacing an existing one with the same id in place.
    /// Returns true when an entry was replaced.
    pub fn insert(&mut self, entry: ApplicationEntry) -> bool {
        self.components.insert(entry.id.clone(), entry).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationEntry> {
        self.components.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &ApplicationEntry> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn installed_count(&self) -> usize {
        self.components.values().filter(|e| e.installed).count()
    }
}

/// Cancellation capability carried by a progress payload.
///
/// The UI only requests cancellation; the worker owning the operation polls
/// the flag and decides how to stop.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl PartialEq for CancelHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Progress payload emitted by a running operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressData {
    pub percentage: Option<u8>,
    pub message: Option<String>,
    /// Blocked behind another program holding the package manager.
    pub waiting: bool,
    /// Present while the backend allows cancelling.
    pub cancel: Option<CancelHandle>,
}

impl ProgressData {
    pub fn fraction(&self) -> Option<f32> {
        self.percentage.map(|p| f32::from(p.min(100)) / 100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateColors {
    pub default: Color32,
    pub hover: Color32,
    pub busy: Color32,
}
