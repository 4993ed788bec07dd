//! Long-running package operations: the handle the UI holds, the settler the
//! worker holds, and the backend trait that hands them out.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, TryRecvError};

use crate::error::OperationError;
use crate::types::{CancelHandle, ProgressData};

/// Result of a settled operation.
pub type Settlement = Result<(), OperationError>;

/// Message sent from an operation worker to the UI thread.
#[derive(Debug)]
pub enum OperationEvent {
    Progress(ProgressData),
    Settled(Settlement),
}

/// Package operations the list and rows can start.
///
/// Every returned handle emits zero or more progress events and then settles
/// exactly once.
pub trait PackageBackend {
    fn install(&self, pkgname: &str) -> OperationHandle;

    /// Remove the package owning `file`.
    fn remove(&self, file: &Path) -> OperationHandle;

    fn refresh(
        &self,
        origin_files: &[PathBuf],
        config_packages: &[String],
        data_packages: &[String],
    ) -> OperationHandle;
}

/// UI side of an in-flight operation. Dropping it releases the subscription.
#[derive(Debug)]
pub struct OperationHandle {
    events: mpsc::Receiver<OperationEvent>,
    cancel: CancelHandle,
}

impl OperationHandle {
    /// Create a connected handle/settler pair.
    pub fn channel() -> (OperationHandle, OperationSettler) {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelHandle::new();
        (
            OperationHandle {
                events: rx,
                cancel: cancel.clone(),
            },
            OperationSettler {
                tx,
                cancel,
                settled: false,
            },
        )
    }

    /// Drain pending events without blocking.
    ///
    /// Progress events overwrite `progress`; events queued behind the
    /// settlement are never read. Returns the settlement once it arrives.
    pub fn drain(&mut self, progress: &mut Option<ProgressData>) -> Option<Settlement> {
        loop {
            match self.events.try_recv() {
                Ok(OperationEvent::Progress(p)) => *progress = Some(p),
                Ok(OperationEvent::Settled(result)) => return Some(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(Err(OperationError::Aborted)),
            }
        }
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }
}

/// Worker side of an operation.
///
/// Dropping a settler that never settled sends `OperationError::Aborted`, so
/// the UI always sees exactly one settlement even if the worker panics.
pub struct OperationSettler {
    tx: mpsc::Sender<OperationEvent>,
    cancel: CancelHandle,
    settled: bool,
}

impl OperationSettler {
    pub fn progress(&self, data: ProgressData) {
        let _ = self.tx.send(OperationEvent::Progress(data));
    }

    pub fn cancel_handle(&self) -> &CancelHandle {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_requested()
    }

    pub fn settle(mut self, result: Settlement) {
        self.settled = true;
        let _ = self.tx.send(OperationEvent::Settled(result));
    }

    /// Progress reporter mapping 0..=100 of one stage onto `base..base+range`
    /// of the whole operation.
    pub fn stage(&self, base: u8, range: u8) -> StageProgress<'_> {
        StageProgress {
            settler: self,
            base,
            range,
            last: None,
        }
    }
}

impl Drop for OperationSettler {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self
                .tx
                .send(OperationEvent::Settled(Err(OperationError::Aborted)));
        }
    }
}

pub struct StageProgress<'a> {
    settler: &'a OperationSettler,
    base: u8,
    range: u8,
    last: Option<u8>,
}

impl StageProgress<'_> {
    /// Report stage-local progress. A missing percentage keeps the last one.
    pub fn report(&mut self, percentage: Option<u8>, message: Option<String>, waiting: bool) {
        if let Some(p) = percentage {
            let scaled = u16::from(self.base) + u16::from(p.min(100)) * u16::from(self.range) / 100;
            self.last = Some(scaled.min(100) as u8);
        }
        self.settler.progress(ProgressData {
            percentage: self.last.or(Some(self.base)),
            message,
            waiting,
            cancel: Some(self.settler.cancel_handle().clone()),
        });
    }

    pub fn is_cancelled(&self) -> bool {
        self.settler.is_cancelled()
    }
}
