//! [`TestPbx`] fixture for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pbx_core::{ConfigFileProbe, ExtensionRecord, MemoryDeclaredStore, SyncPolicy};
use pbx_sections::ConfigSectionStore;
use tempfile::TempDir;

use crate::doubles::RecordingReload;

/// A temporary directory holding a `pjsip.conf`, with an in-memory declared
/// store, a probe reading the file, and a recording reload trigger.
///
/// # Example
///
/// ```rust,no_run
/// use pbx_test_utils::{TestPbx, extension};
///
/// let pbx = TestPbx::new().with_declared([extension("101")]);
/// pbx.policy().sync_declared_to_runtime("101").unwrap();
/// pbx.assert_config_contains("; BEGIN Extension 101");
/// ```
pub struct TestPbx {
    temp_dir: TempDir,
    pub sections: Arc<ConfigSectionStore>,
    pub declared: Arc<MemoryDeclaredStore>,
    pub probe: Arc<ConfigFileProbe>,
    pub reload: Arc<RecordingReload>,
}

impl Default for TestPbx {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPbx {
    /// An empty `pjsip.conf` and an empty declared store.
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// A `pjsip.conf` holding `content`.
    pub fn with_config(content: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("pjsip.conf");
        fs::write(&path, content).unwrap();

        let sections = Arc::new(ConfigSectionStore::new(path));
        let probe = Arc::new(ConfigFileProbe::new(sections.clone()));
        Self {
            temp_dir,
            sections,
            declared: Arc::new(MemoryDeclaredStore::new()),
            probe,
            reload: Arc::new(RecordingReload::new()),
        }
    }

    /// Replace the declared store with one seeded from `records`.
    pub fn with_declared(mut self, records: impl IntoIterator<Item = ExtensionRecord>) -> Self {
        self.declared = Arc::new(MemoryDeclaredStore::with_records(records));
        self
    }

    /// A policy over this fixture's collaborators.
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy::new(
            self.sections.clone(),
            self.declared.clone(),
            self.probe.clone(),
        )
        .with_reload(self.reload.clone())
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.sections.path().to_path_buf()
    }

    pub fn config(&self) -> String {
        fs::read_to_string(self.sections.path()).unwrap()
    }

    pub fn backups(&self) -> Vec<PathBuf> {
        pbx_fs::list_backups(self.sections.path()).unwrap()
    }

    /// # Panics
    /// Panics if the config file does not contain `needle`.
    pub fn assert_config_contains(&self, needle: &str) {
        let content = self.config();
        assert!(
            content.contains(needle),
            "pjsip.conf does not contain expected content.\nExpected: {}\nActual: {}",
            needle,
            content
        );
    }
}
