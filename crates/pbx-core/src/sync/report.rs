//! Result types for sync operations
//!
//! Single-item operations return a [`SyncOutcome`]; bulk operations return a
//! [`BulkReport`] that always covers every attempted item; the startup pass
//! returns a [`SyncResult`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ReloadError};
use crate::model::DriftField;

/// What a single-item operation changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncAction {
    /// The extension's section was written or replaced
    SectionWritten,
    /// The extension's section was commented out
    SectionCommentedOut,
    /// The extension's section was deleted
    SectionRemoved,
    /// The declared record was inserted or updated
    DeclaredUpdated,
    /// Both sides already agreed; nothing was written
    Unchanged,
}

/// Successful single-item operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub number: String,
    pub action: SyncAction,
    /// Backup taken before the config file was modified, if it was.
    pub backup: Option<PathBuf>,
    /// Set when the change was applied but the server could not be reloaded.
    /// The change itself stands; a manual reload may be required.
    pub reload_warning: Option<ReloadError>,
}

impl SyncOutcome {
    pub fn new(number: impl Into<String>, action: SyncAction) -> Self {
        Self {
            number: number.into(),
            action,
            backup: None,
            reload_warning: None,
        }
    }

    pub fn with_backup(mut self, backup: Option<PathBuf>) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_reload_warning(mut self, warning: Option<ReloadError>) -> Self {
        self.reload_warning = warning;
        self
    }

    pub fn changed(&self) -> bool {
        self.action != SyncAction::Unchanged
    }
}

/// One item of a bulk operation that failed, with its cause
#[derive(Debug)]
pub struct ItemFailure {
    pub number: String,
    pub error: Error,
}

/// Result of a bulk operation: successes plus per-item failures
///
/// A bulk operation never stops at the first failing item, so
/// `succeeded + failures.len()` is the number of items attempted.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
    pub reload_warning: Option<ReloadError>,
}

impl BulkReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Every attempted item succeeded.
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record<T>(&mut self, number: &str, result: Result<T, Error>) {
        match result {
            Ok(_) => self.succeeded += 1,
            Err(error) => {
                tracing::warn!(number, error = %error, "Sync failed for extension");
                self.failures.push(ItemFailure {
                    number: number.to_string(),
                    error,
                });
            }
        }
    }
}

/// Two-sided drift left for a human to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub number: String,
    pub differences: Vec<DriftField>,
}

/// Result of an automatic startup pass
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Declared-only items written to the runtime configuration
    pub pushed: usize,
    /// Runtime-only items recorded in the declared store
    pub pulled: usize,
    pub already_in_sync: usize,
    /// Mismatches, never resolved automatically
    pub conflicts: Vec<Conflict>,
    /// One-sided items whose heal attempt failed
    pub failures: Vec<ItemFailure>,
    pub reload_warning: Option<ReloadError>,
}

impl SyncResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Nothing is left for a human: no conflicts and no failures.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.failures.is_empty()
    }

    pub fn conflict_numbers(&self) -> Vec<&str> {
        self.conflicts.iter().map(|c| c.number.as_str()).collect()
    }
}
