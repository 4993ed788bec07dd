//! Host-side collaborators the list and rows call out to: launching,
//! navigation and the global error surface.

use tracing::{error, info};

use crate::config::CommandTemplate;
use crate::core::launch_application;
use crate::types::ApplicationEntry;

const MAX_STATUS_MSGS: usize = 200;

pub trait Shell {
    /// Fire-and-forget start of an installed application.
    fn launch(&mut self, entry: &ApplicationEntry);

    /// Show the per-entry location keyed by `id`.
    fn navigate(&mut self, id: &str);

    /// Global error surface.
    fn report_error(&mut self, message: &str);
}

/// Shell used by the desktop app: runs the launch command, remembers the
/// navigated entry and keeps a bounded status log for the status bar.
pub struct DesktopShell {
    launch: CommandTemplate,
    location: Option<String>,
    status_msgs: Vec<String>,
}

impl DesktopShell {
    pub fn new(launch: CommandTemplate) -> Self {
        Self {
            launch,
            location: None,
            status_msgs: Vec::new(),
        }
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn close_location(&mut self) {
        self.location = None;
    }

    pub fn status_msgs(&self) -> &[String] {
        &self.status_msgs
    }

    pub fn push_status(&mut self, msg: impl Into<String>) {
        self.status_msgs.push(msg.into());
        if self.status_msgs.len() > MAX_STATUS_MSGS {
            let excess = self.status_msgs.len() - MAX_STATUS_MSGS;
            self.status_msgs.drain(..excess);
        }
    }
}

impl Shell for DesktopShell {
    fn launch(&mut self, entry: &ApplicationEntry) {
        let target = entry.launchable.as_deref().unwrap_or(&entry.id);
        match launch_application(&self.launch, target) {
            Ok(()) => self.push_status(format!("Launched {}", entry.name)),
            Err(e) => self.report_error(&format!("Cannot launch {}: {e:#}", entry.name)),
        }
    }

    fn navigate(&mut self, id: &str) {
        info!(id = id, "navigate");
        self.location = Some(id.to_string());
    }

    fn report_error(&mut self, message: &str) {
        error!("{message}");
        self.push_status(format!("Error: {message}"));
    }
}
