//! Test doubles for the collaborator traits.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pbx_core::{
    DeclaredStore, Error, ExtensionRecord, ReloadError, ReloadTrigger, Result, RuntimeProbe,
    RuntimeSnapshot,
};

/// Reload trigger that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingReload {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingReload {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trigger whose every call fails.
    pub fn failing() -> Self {
        let reload = Self::default();
        reload.set_failing(true);
        reload
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReloadTrigger for RecordingReload {
    fn reload(&self) -> std::result::Result<(), ReloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(ReloadError::new("server unreachable"))
        } else {
            Ok(())
        }
    }
}

/// Runtime probe returning a fixed, replaceable snapshot list.
#[derive(Debug, Default)]
pub struct StaticProbe {
    snapshots: Mutex<Vec<RuntimeSnapshot>>,
}

impl StaticProbe {
    pub fn new(snapshots: Vec<RuntimeSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
        }
    }

    pub fn set(&self, snapshots: Vec<RuntimeSnapshot>) {
        *self.snapshots.lock().unwrap() = snapshots;
    }
}

impl RuntimeProbe for StaticProbe {
    fn snapshot(&self) -> Result<Vec<RuntimeSnapshot>> {
        Ok(self.snapshots.lock().unwrap().clone())
    }
}

/// Runtime probe that is always unreachable.
#[derive(Debug, Default)]
pub struct FailingProbe;

impl RuntimeProbe for FailingProbe {
    fn snapshot(&self) -> Result<Vec<RuntimeSnapshot>> {
        Err(Error::Probe {
            message: "runtime unreachable".into(),
        })
    }
}

/// Declared store that is always unavailable.
#[derive(Debug, Default)]
pub struct FailingDeclaredStore;

impl DeclaredStore for FailingDeclaredStore {
    fn list_all(&self) -> Result<Vec<ExtensionRecord>> {
        Err(Error::DeclaredStore {
            message: "database unavailable".into(),
        })
    }

    fn upsert(&self, _record: ExtensionRecord) -> Result<()> {
        self.list_all().map(|_| ())
    }

    fn remove(&self, _number: &str) -> Result<bool> {
        self.list_all().map(|_| false)
    }
}
