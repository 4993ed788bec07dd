//! Recording fakes for the backend and shell collaborators.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::operation::{OperationHandle, OperationSettler, PackageBackend};
use crate::shell::Shell;
use crate::types::{ApplicationCollection, ApplicationEntry, ProgressData};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Install(String),
    Remove(PathBuf),
    Refresh {
        origin_files: Vec<PathBuf>,
        config_packages: Vec<String>,
        data_packages: Vec<String>,
    },
}

/// Backend whose operations stay pending until the test settles them.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: RefCell<Vec<Call>>,
    settlers: RefCell<Vec<OperationSettler>>,
}

impl FakeBackend {
    fn start(&self, call: Call) -> OperationHandle {
        self.calls.borrow_mut().push(call);
        let (handle, settler) = OperationHandle::channel();
        self.settlers.borrow_mut().push(settler);
        handle
    }

    /// Settler of the most recently started operation.
    pub fn take_last(&self) -> OperationSettler {
        self.settlers
            .borrow_mut()
            .pop()
            .expect("no pending operation")
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl PackageBackend for FakeBackend {
    fn install(&self, pkgname: &str) -> OperationHandle {
        self.start(Call::Install(pkgname.to_string()))
    }

    fn remove(&self, file: &Path) -> OperationHandle {
        self.start(Call::Remove(file.to_path_buf()))
    }

    fn refresh(
        &self,
        origin_files: &[PathBuf],
        config_packages: &[String],
        data_packages: &[String],
    ) -> OperationHandle {
        self.start(Call::Refresh {
            origin_files: origin_files.to_vec(),
            config_packages: config_packages.to_vec(),
            data_packages: data_packages.to_vec(),
        })
    }
}

#[derive(Default)]
pub struct FakeShell {
    pub launched: Vec<String>,
    pub navigated: Vec<String>,
    pub errors: Vec<String>,
}

impl Shell for FakeShell {
    fn launch(&mut self, entry: &ApplicationEntry) {
        self.launched.push(entry.id.clone());
    }

    fn navigate(&mut self, id: &str) {
        self.navigated.push(id.to_string());
    }

    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

pub fn entry(id: &str, name: &str, installed: bool) -> ApplicationEntry {
    ApplicationEntry {
        id: id.to_string(),
        name: name.to_string(),
        summary: format!("{name} summary"),
        icon: None,
        installed,
        pkgname: format!("{id}-pkg"),
        file: PathBuf::from(format!("/usr/share/metainfo/{id}.metainfo.xml")),
        launchable: None,
    }
}

pub fn collection(entries: Vec<ApplicationEntry>, ready: bool) -> ApplicationCollection {
    let mut c = ApplicationCollection::default();
    for e in entries {
        c.insert(e);
    }
    c.ready = ready;
    c
}

pub fn progress(pct: u8) -> ProgressData {
    ProgressData {
        percentage: Some(pct),
        ..Default::default()
    }
}
