//! ReconciliationEngine implementation
//!
//! Compares the declared record set with a runtime snapshot set and
//! classifies every extension number found on either side.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::Result;
use crate::model::{DriftField, ExtensionRecord, NumberKey, RuntimeSnapshot};
use crate::traits::{DeclaredStore, RuntimeProbe};

use super::status::{SyncInfo, SyncStatus, SyncSummary};

/// Classify every number in `declared ∪ runtime`.
///
/// Pure: no I/O, no side effects. The result holds exactly one entry per
/// distinct number, ordered by number. If a number appears twice on one
/// side, the first occurrence wins.
pub fn compare(declared: &[ExtensionRecord], runtime: &[RuntimeSnapshot]) -> Vec<SyncInfo> {
    let mut index: BTreeMap<NumberKey, (Option<&ExtensionRecord>, Option<&RuntimeSnapshot>)> =
        BTreeMap::new();

    for record in declared {
        let entry = index.entry(NumberKey(record.number.clone())).or_default();
        if entry.0.is_some() {
            tracing::warn!(number = %record.number, "Duplicate declared record ignored");
            continue;
        }
        entry.0 = Some(record);
    }

    for snapshot in runtime {
        let entry = index.entry(NumberKey(snapshot.number.clone())).or_default();
        if entry.1.is_some() {
            tracing::warn!(number = %snapshot.number, "Duplicate runtime entry ignored");
            continue;
        }
        entry.1 = Some(snapshot);
    }

    index
        .into_iter()
        .map(|(NumberKey(number), (declared, runtime))| {
            let (status, differences) = classify(declared, runtime);
            SyncInfo {
                number,
                declared: declared.cloned(),
                runtime: runtime.cloned(),
                status,
                differences,
            }
        })
        .collect()
}

fn classify(
    declared: Option<&ExtensionRecord>,
    runtime: Option<&RuntimeSnapshot>,
) -> (SyncStatus, Vec<DriftField>) {
    match (declared, runtime) {
        (Some(record), Some(snapshot)) => {
            let differences = diff(record, snapshot);
            if differences.is_empty() {
                (SyncStatus::Match, differences)
            } else {
                (SyncStatus::Mismatch, differences)
            }
        }
        // A disabled record is meant to have no active section.
        (Some(record), None) if !record.enabled => (SyncStatus::Match, Vec::new()),
        (Some(_), None) => (SyncStatus::DeclaredOnly, Vec::new()),
        (None, Some(_)) => (SyncStatus::RuntimeOnly, Vec::new()),
        (None, None) => unreachable!("index entries always have at least one side"),
    }
}

/// Every comparable field on which `snapshot` disagrees with `record`.
///
/// A disabled record still live in the runtime differs only in `enabled`;
/// its other fields are moot.
pub fn diff(record: &ExtensionRecord, snapshot: &RuntimeSnapshot) -> Vec<DriftField> {
    if !record.enabled {
        return vec![DriftField::Enabled];
    }
    DriftField::COMPARABLE
        .into_iter()
        .filter(|field| field.differs(record, snapshot))
        .collect()
}

/// Counts per status plus the total.
pub fn summarize(infos: &[SyncInfo]) -> SyncSummary {
    infos.iter().fold(SyncSummary::default(), |mut summary, info| {
        match info.status {
            SyncStatus::Match => summary.matched += 1,
            SyncStatus::DeclaredOnly => summary.declared_only += 1,
            SyncStatus::RuntimeOnly => summary.runtime_only += 1,
            SyncStatus::Mismatch => summary.mismatched += 1,
        }
        summary.total += 1;
        summary
    })
}

/// Loads both sides through their collaborators and compares them.
#[derive(Clone)]
pub struct ReconciliationEngine {
    declared: Arc<dyn DeclaredStore>,
    probe: Arc<dyn RuntimeProbe>,
}

impl ReconciliationEngine {
    pub fn new(declared: Arc<dyn DeclaredStore>, probe: Arc<dyn RuntimeProbe>) -> Self {
        Self { declared, probe }
    }

    pub fn declared(&self) -> &dyn DeclaredStore {
        self.declared.as_ref()
    }

    pub fn probe(&self) -> &dyn RuntimeProbe {
        self.probe.as_ref()
    }

    /// Fresh comparison of the current declared records and runtime snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if either side cannot be loaded.
    pub fn snapshot_comparison(&self) -> Result<Vec<SyncInfo>> {
        let declared = self.declared.list_all()?;
        let runtime = self.probe.snapshot()?;
        let infos = compare(&declared, &runtime);

        let summary = summarize(&infos);
        tracing::debug!(
            total = summary.total,
            matched = summary.matched,
            declared_only = summary.declared_only,
            runtime_only = summary.runtime_only,
            mismatched = summary.mismatched,
            "Compared declared and runtime state"
        );
        Ok(infos)
    }

    /// Comparison entry for a single number, if either side knows it.
    pub fn compare_one(&self, number: &str) -> Result<Option<SyncInfo>> {
        let declared: Vec<_> = self.declared.get(number)?.into_iter().collect();
        let runtime: Vec<_> = self.probe.lookup(number)?.into_iter().collect();
        Ok(compare(&declared, &runtime).into_iter().next())
    }
}
