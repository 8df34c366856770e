//! SyncPolicy implementation
//!
//! The SyncPolicy turns a reconciliation result into corrective action. It
//! pushes declared records into the generated configuration, pulls runtime
//! state into the declared store, and runs the startup pass that heals
//! one-sided drift while leaving two-sided drift to a human.

use std::sync::Arc;

use pbx_sections::ConfigSectionStore;

use crate::config::StaticBlock;
use crate::error::{Error, ReloadError, Result};
use crate::model::{ExtensionRecord, RuntimeSnapshot};
use crate::reconcile::{ReconciliationEngine, SyncInfo, SyncStatus};
use crate::reload::NoopReload;
use crate::render::PjsipRenderer;
use crate::traits::{ConfigRenderer, DeclaredStore, ReloadTrigger, RuntimeProbe};

use super::report::{BulkReport, Conflict, SyncAction, SyncOutcome, SyncResult};

/// Executes directional syncs between the declared store and the runtime
/// configuration.
///
/// Every operation is synchronous and meant to be driven from one control
/// thread; the section store serializes the file writes.
pub struct SyncPolicy {
    engine: ReconciliationEngine,
    sections: Arc<ConfigSectionStore>,
    renderer: Arc<dyn ConfigRenderer>,
    reload: Arc<dyn ReloadTrigger>,
}

impl SyncPolicy {
    /// Create a policy with the PJSIP renderer and no reload trigger.
    pub fn new(
        sections: Arc<ConfigSectionStore>,
        declared: Arc<dyn DeclaredStore>,
        probe: Arc<dyn RuntimeProbe>,
    ) -> Self {
        Self {
            engine: ReconciliationEngine::new(declared, probe),
            sections,
            renderer: Arc::new(PjsipRenderer::default()),
            reload: Arc::new(NoopReload),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ConfigRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_reload(mut self, reload: Arc<dyn ReloadTrigger>) -> Self {
        self.reload = reload;
        self
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn sections(&self) -> &ConfigSectionStore {
        &self.sections
    }

    /// Fresh classification of every known extension.
    pub fn compare(&self) -> Result<Vec<SyncInfo>> {
        self.engine.snapshot_comparison()
    }

    /// Make the runtime configuration reflect the declared record.
    ///
    /// An enabled record is rendered and written; a disabled one has its
    /// section commented out. The server is reloaded afterwards; a failed
    /// reload is reported on the outcome, not as an error.
    ///
    /// # Errors
    ///
    /// `NotInDeclaredStore` if the record does not exist, `InvalidRecord` if
    /// it fails validation, or the section store's error if the write fails.
    pub fn sync_declared_to_runtime(&self, number: &str) -> Result<SyncOutcome> {
        let record = self
            .engine
            .declared()
            .get(number)?
            .ok_or_else(|| Error::NotInDeclaredStore {
                number: number.to_string(),
            })?;

        let outcome = self.push_record(&record)?;
        Ok(outcome.with_reload_warning(self.trigger_reload()))
    }

    /// Record the runtime's view of an extension in the declared store.
    ///
    /// # Errors
    ///
    /// `NotInRuntime` if the runtime does not report the number.
    pub fn sync_runtime_to_declared(&self, number: &str) -> Result<SyncOutcome> {
        let snapshot = self
            .engine
            .probe()
            .lookup(number)?
            .ok_or_else(|| Error::NotInRuntime {
                number: number.to_string(),
            })?;
        let existing = self.engine.declared().get(number)?;

        self.pull_snapshot(existing.as_ref(), &snapshot)
    }

    /// Push every `DeclaredOnly` and `Mismatch` item.
    ///
    /// Every eligible item is attempted; failures are collected per item.
    /// The server is reloaded once at the end if anything succeeded.
    ///
    /// # Errors
    ///
    /// Only if the comparison itself cannot be computed.
    pub fn sync_all_declared_to_runtime(&self) -> Result<BulkReport> {
        let infos = self.compare()?;
        let mut report = BulkReport::default();

        for info in infos.iter().filter(|info| info.status.pushable()) {
            report.record(&info.number, self.push_info(info));
        }

        if report.succeeded > 0 {
            report.reload_warning = self.trigger_reload();
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "Pushed declared records to runtime"
        );
        Ok(report)
    }

    /// Pull every `RuntimeOnly` and `Mismatch` item.
    ///
    /// # Errors
    ///
    /// Only if the comparison itself cannot be computed.
    pub fn sync_all_runtime_to_declared(&self) -> Result<BulkReport> {
        let infos = self.compare()?;
        let mut report = BulkReport::default();

        for info in infos.iter().filter(|info| info.status.pullable()) {
            report.record(&info.number, self.pull_info(info));
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "Pulled runtime state into declared store"
        );
        Ok(report)
    }

    /// Startup pass: heal one-sided drift, report two-sided drift.
    ///
    /// - `DeclaredOnly` is pushed, so the administrator's intent takes effect.
    /// - `RuntimeOnly` is pulled, so a later push cannot erase it.
    /// - `Mismatch` is left untouched on both sides and reported as a
    ///   [`Conflict`].
    /// - `Match` is counted.
    ///
    /// # Errors
    ///
    /// Only if either side cannot be loaded; callers should treat this as a
    /// warning and carry on starting up.
    pub fn auto_sync(&self) -> Result<SyncResult> {
        let infos = self.compare()?;
        let mut result = SyncResult::default();
        let mut pushes = BulkReport::default();
        let mut pulls = BulkReport::default();

        for info in &infos {
            match info.status {
                SyncStatus::Match => result.already_in_sync += 1,
                SyncStatus::DeclaredOnly => pushes.record(&info.number, self.push_info(info)),
                SyncStatus::RuntimeOnly => pulls.record(&info.number, self.pull_info(info)),
                SyncStatus::Mismatch => {
                    tracing::warn!(
                        number = %info.number,
                        differences = ?info.difference_names(),
                        "Conflict left for manual resolution"
                    );
                    result.conflicts.push(Conflict {
                        number: info.number.clone(),
                        differences: info.differences.clone(),
                    });
                }
            }
        }

        result.pushed = pushes.succeeded;
        result.pulled = pulls.succeeded;
        result.failures = pushes.failures;
        result.failures.extend(pulls.failures);

        if result.pushed > 0 {
            result.reload_warning = self.trigger_reload();
        }

        tracing::info!(
            pushed = result.pushed,
            pulled = result.pulled,
            in_sync = result.already_in_sync,
            conflicts = result.conflicts.len(),
            failures = result.failures.len(),
            "Auto-sync finished"
        );
        Ok(result)
    }

    /// Toggle a declared record and apply the change to the runtime
    /// configuration. Disabling comments the section out so hand-tuned
    /// settings survive until it is enabled again.
    ///
    /// # Errors
    ///
    /// `NotInDeclaredStore` if the record does not exist. If the record is
    /// invalid or the configuration write fails, the declared record is left
    /// as it was.
    pub fn set_enabled(&self, number: &str, enabled: bool) -> Result<SyncOutcome> {
        let declared = self.engine.declared();
        let previous = declared
            .get(number)?
            .ok_or_else(|| Error::NotInDeclaredStore {
                number: number.to_string(),
            })?;

        let mut record = previous.clone();
        record.enabled = enabled;
        record.validate()?;

        if record == previous {
            let outcome = self.push_record(&record)?;
            return Ok(outcome.with_reload_warning(self.trigger_reload()));
        }

        declared.upsert(record.clone())?;
        tracing::info!(number, enabled, "Updated declared record");

        match self.push_record(&record) {
            Ok(outcome) => Ok(outcome.with_reload_warning(self.trigger_reload())),
            Err(e) => {
                if let Err(restore) = declared.upsert(previous) {
                    tracing::error!(
                        number,
                        error = %restore,
                        "Could not restore declared record after failed push"
                    );
                }
                Err(e)
            }
        }
    }

    pub fn enable_extension(&self, number: &str) -> Result<SyncOutcome> {
        self.set_enabled(number, true)
    }

    pub fn disable_extension(&self, number: &str) -> Result<SyncOutcome> {
        self.set_enabled(number, false)
    }

    /// Delete an extension: its declared record and its section.
    ///
    /// Deleting a number neither side knows is a no-op. The section goes
    /// first; if that fails the declared record is kept.
    pub fn delete_extension(&self, number: &str) -> Result<SyncOutcome> {
        let label = self.renderer.section_label(number);
        let mutation = self.sections.remove_section(&label)?;
        let removed_record = self.engine.declared().remove(number)?;

        let action = if mutation.changed() {
            SyncAction::SectionRemoved
        } else if removed_record {
            SyncAction::DeclaredUpdated
        } else {
            SyncAction::Unchanged
        };

        let warning = mutation.changed().then(|| self.trigger_reload()).flatten();
        tracing::info!(number, ?action, "Deleted extension");
        Ok(SyncOutcome::new(number, action)
            .with_backup(mutation.backup().map(|p| p.to_path_buf()))
            .with_reload_warning(warning))
    }

    /// Write each infrastructure block unless its label already exists.
    ///
    /// Returns how many blocks were written.
    pub fn ensure_infrastructure(&self, blocks: &[StaticBlock]) -> Result<usize> {
        let mut written = 0;
        for block in blocks {
            if self
                .sections
                .ensure_static_block(&block.label, &block.body)?
                .changed()
            {
                written += 1;
            }
        }
        if written > 0
            && let Some(warning) = self.trigger_reload()
        {
            tracing::warn!(error = %warning, "Infrastructure written but reload failed");
        }
        Ok(written)
    }

    fn push_info(&self, info: &SyncInfo) -> Result<SyncOutcome> {
        match &info.declared {
            Some(record) => self.push_record(record),
            None => Err(Error::NotInDeclaredStore {
                number: info.number.clone(),
            }),
        }
    }

    fn pull_info(&self, info: &SyncInfo) -> Result<SyncOutcome> {
        match &info.runtime {
            Some(snapshot) => self.pull_snapshot(info.declared.as_ref(), snapshot),
            None => Err(Error::NotInRuntime {
                number: info.number.clone(),
            }),
        }
    }

    fn push_record(&self, record: &ExtensionRecord) -> Result<SyncOutcome> {
        record.validate()?;
        let label = self.renderer.section_label(&record.number);

        let (action, mutation) = if record.enabled {
            let body = self.renderer.render_section(record);
            let mutation = self.sections.write_section(&label, &body)?;
            (SyncAction::SectionWritten, mutation)
        } else if self.sections.is_active(&label)? {
            let mutation = self.sections.comment_out_section(&label)?;
            (SyncAction::SectionCommentedOut, mutation)
        } else {
            tracing::debug!(number = %record.number, "Disabled extension has no active section");
            return Ok(SyncOutcome::new(&record.number, SyncAction::Unchanged));
        };

        let action = if mutation.changed() {
            action
        } else {
            SyncAction::Unchanged
        };
        tracing::info!(number = %record.number, ?action, "Pushed declared record");
        Ok(SyncOutcome::new(&record.number, action)
            .with_backup(mutation.backup().map(|p| p.to_path_buf())))
    }

    fn pull_snapshot(
        &self,
        existing: Option<&ExtensionRecord>,
        snapshot: &RuntimeSnapshot,
    ) -> Result<SyncOutcome> {
        let record = record_from_snapshot(existing, snapshot);
        record.validate()?;

        if existing == Some(&record) {
            return Ok(SyncOutcome::new(&record.number, SyncAction::Unchanged));
        }

        let number = record.number.clone();
        self.engine.declared().upsert(record)?;
        tracing::info!(number = %number, "Pulled runtime state into declared store");
        Ok(SyncOutcome::new(number, SyncAction::DeclaredUpdated))
    }

    fn trigger_reload(&self) -> Option<ReloadError> {
        match self.reload.reload() {
            Ok(()) => {
                tracing::debug!("Reload triggered");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reload failed; a manual reload may be required");
                Some(e)
            }
        }
    }
}

/// The declared record a runtime→declared pull produces.
///
/// Reported comparable fields come from the runtime. Unreported fields, the
/// display name and the secret keep the existing record's values; without an
/// existing record they come from the snapshot where it has them, else from
/// defaults. A pulled record is always enabled, since the runtime has it
/// live.
pub fn record_from_snapshot(
    existing: Option<&ExtensionRecord>,
    snapshot: &RuntimeSnapshot,
) -> ExtensionRecord {
    let mut record = existing
        .cloned()
        .unwrap_or_else(|| ExtensionRecord::new(&snapshot.number));

    if existing.is_none()
        && let Some(name) = &snapshot.display_name
    {
        record.display_name = name.clone();
    }
    if record.secret.is_empty()
        && let Some(secret) = &snapshot.secret
    {
        record.secret = secret.clone();
    }

    if let Some(context) = &snapshot.context {
        record.context = context.clone();
    }
    if let Some(transport) = &snapshot.transport {
        record.transport = transport.clone();
    }
    if let Some(codecs) = &snapshot.codecs {
        record.codecs = codecs.clone();
    }
    if let Some(direct_media) = snapshot.direct_media {
        record.direct_media = direct_media;
    }
    if let Some(max_contacts) = snapshot.max_contacts {
        record.max_contacts = max_contacts;
    }
    if let Some(qualify_frequency) = snapshot.qualify_frequency {
        record.qualify_frequency = qualify_frequency;
    }
    record.enabled = true;
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Secret;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_from_snapshot_new() {
        let mut snapshot = RuntimeSnapshot::new("300");
        snapshot.display_name = Some("Lobby".into());
        snapshot.secret = Some(Secret::new("s3"));
        snapshot.codecs = Some(vec!["g722".into()]);

        let record = record_from_snapshot(None, &snapshot);

        assert_eq!(record.number, "300");
        assert_eq!(record.display_name, "Lobby");
        assert_eq!(record.secret.expose(), "s3");
        assert_eq!(record.codecs, vec!["g722".to_string()]);
        assert_eq!(record.context, "from-internal");
        assert!(record.enabled);
    }

    #[test]
    fn test_record_from_snapshot_keeps_identity() {
        let mut existing = ExtensionRecord::new("101");
        existing.display_name = "Alice".into();
        existing.secret = Secret::new("declared");
        existing.enabled = false;
        let mut snapshot = RuntimeSnapshot::from_record(&existing);
        snapshot.display_name = Some("Someone else".into());
        snapshot.secret = Some(Secret::new("runtime"));
        snapshot.context = Some("sales".into());
        snapshot.max_contacts = None;

        let record = record_from_snapshot(Some(&existing), &snapshot);

        assert_eq!(record.display_name, "Alice");
        assert_eq!(record.secret.expose(), "declared");
        assert_eq!(record.context, "sales");
        assert_eq!(record.max_contacts, existing.max_contacts);
        assert!(record.enabled);
    }
}
