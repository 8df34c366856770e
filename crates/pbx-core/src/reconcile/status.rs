//! Classification types produced by reconciliation
//!
//! Provides types for reporting how each extension's declared record relates
//! to what the runtime reports.

use serde::{Deserialize, Serialize};

use crate::model::{DriftField, ExtensionRecord, RuntimeSnapshot};

/// How one extension's declared and runtime state relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Present on both sides with identical comparable fields
    Match,
    /// Declared but absent from the runtime
    DeclaredOnly,
    /// Present in the runtime but never declared
    RuntimeOnly,
    /// Present on both sides with at least one differing field
    Mismatch,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Match => "match",
            SyncStatus::DeclaredOnly => "declared-only",
            SyncStatus::RuntimeOnly => "runtime-only",
            SyncStatus::Mismatch => "mismatch",
        }
    }

    /// Whether a declared→runtime push would act on this status.
    pub fn pushable(&self) -> bool {
        matches!(self, SyncStatus::DeclaredOnly | SyncStatus::Mismatch)
    }

    /// Whether a runtime→declared pull would act on this status.
    pub fn pullable(&self) -> bool {
        matches!(self, SyncStatus::RuntimeOnly | SyncStatus::Mismatch)
    }
}

/// Comparison result for one extension number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncInfo {
    pub number: String,
    pub declared: Option<ExtensionRecord>,
    pub runtime: Option<RuntimeSnapshot>,
    pub status: SyncStatus,
    /// Every differing field; empty unless `status` is `Mismatch`
    pub differences: Vec<DriftField>,
}

impl SyncInfo {
    /// Differing field names, for display.
    pub fn difference_names(&self) -> Vec<&'static str> {
        self.differences.iter().map(DriftField::as_str).collect()
    }
}

/// Counts per status over a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub matched: usize,
    pub declared_only: usize,
    pub runtime_only: usize,
    pub mismatched: usize,
    pub total: usize,
}

impl SyncSummary {
    /// Every extension matches.
    pub fn is_clean(&self) -> bool {
        self.matched == self.total
    }

    /// Auto-sync has one-sided drift it would heal.
    pub fn needs_action(&self) -> bool {
        self.declared_only + self.runtime_only > 0
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        match status {
            SyncStatus::Match => self.matched,
            SyncStatus::DeclaredOnly => self.declared_only,
            SyncStatus::RuntimeOnly => self.runtime_only,
            SyncStatus::Mismatch => self.mismatched,
        }
    }
}
