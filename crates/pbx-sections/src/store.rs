//! File-backed section store.
//!
//! [`ConfigSectionStore`] owns one generated configuration file and applies
//! the pure edits from [`crate::edit`] to it. Every mutation that changes the
//! file is preceded by a timestamped backup and lands through an atomic
//! rename, so the live file is either the old or the new version.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use pbx_fs::FileLock;

use crate::edit;
use crate::error::Result;
use crate::parser::{Section, find_section, parse_sections};
use crate::syntax::SectionSyntax;

/// Options for a [`ConfigSectionStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub syntax: SectionSyntax,
    /// Keep at most this many backups of the file. `None` keeps all.
    pub max_backups: Option<usize>,
}

/// What a mutating call did to the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The content was already as requested; nothing was written.
    Unchanged,
    /// The file was rewritten after backing it up to `backup`.
    Written { backup: PathBuf },
}

impl MutationOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, MutationOutcome::Written { .. })
    }

    pub fn backup(&self) -> Option<&Path> {
        match self {
            MutationOutcome::Written { backup } => Some(backup),
            MutationOutcome::Unchanged => None,
        }
    }
}

/// Marker-delimited section CRUD over a single configuration file.
///
/// Mutations are serialized by an in-process mutex and an advisory lock on a
/// sibling `.lock` file.
#[derive(Debug)]
pub struct ConfigSectionStore {
    path: PathBuf,
    options: StoreOptions,
    write_guard: Mutex<()>,
}

impl ConfigSectionStore {
    /// Create a store for `path` with the default `;` syntax.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, StoreOptions::default())
    }

    pub fn with_options(path: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            path: path.into(),
            options,
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn syntax(&self) -> &SectionSyntax {
        &self.options.syntax
    }

    /// Create the file empty if it does not exist yet.
    ///
    /// Mutations never create the file implicitly. Returns `true` if the file
    /// was created.
    pub fn init(&self) -> Result<bool> {
        let _guard = self.lock_writes();
        if self.path.exists() {
            return Ok(false);
        }
        pbx_fs::write_text(&self.path, "")?;
        tracing::info!(file = %self.path.display(), "Created empty configuration file");
        Ok(true)
    }

    /// Current file content.
    pub fn read(&self) -> Result<String> {
        Ok(pbx_fs::read_text(&self.path)?)
    }

    /// All well-formed sections in file order.
    pub fn sections(&self) -> Result<Vec<Section>> {
        Ok(parse_sections(&self.read()?, self.syntax()))
    }

    pub fn find_section(&self, label: &str) -> Result<Option<Section>> {
        Ok(find_section(&self.read()?, self.syntax(), label))
    }

    /// Whether an active (non-commented) section with `label` exists.
    pub fn is_active(&self, label: &str) -> Result<bool> {
        Ok(self
            .sections()?
            .iter()
            .any(|section| section.label == label && section.is_active()))
    }

    /// Replace the section with `label`, or append it.
    ///
    /// Afterwards exactly one section with `label` exists and it is active.
    /// Writing the same body twice leaves the file byte-identical.
    pub fn write_section(&self, label: &str, body: &str) -> Result<MutationOutcome> {
        self.mutate("write", label, |content, syntax| {
            edit::upsert_section(content, syntax, label, body).map(Some)
        })
    }

    /// Deactivate the section with `label` without deleting it.
    ///
    /// # Errors
    /// Returns `Error::SectionNotFound` if the label does not exist.
    pub fn comment_out_section(&self, label: &str) -> Result<MutationOutcome> {
        self.mutate("comment_out", label, |content, syntax| {
            edit::comment_out_section(content, syntax, label).map(Some)
        })
    }

    /// Reactivate a section previously deactivated by
    /// [`Self::comment_out_section`].
    ///
    /// # Errors
    /// Returns `Error::SectionNotFound` if the label does not exist.
    pub fn restore_section(&self, label: &str) -> Result<MutationOutcome> {
        self.mutate("restore", label, |content, syntax| {
            edit::restore_section(content, syntax, label).map(Some)
        })
    }

    /// Delete the section with `label`. A missing label is not an error.
    pub fn remove_section(&self, label: &str) -> Result<MutationOutcome> {
        self.mutate("remove", label, |content, syntax| {
            Ok(Some(edit::remove_section(content, syntax, label)))
        })
    }

    /// Append an infrastructure section unless one with `label` exists.
    pub fn ensure_static_block(&self, label: &str, body: &str) -> Result<MutationOutcome> {
        self.mutate("ensure", label, |content, syntax| {
            edit::ensure_section(content, syntax, label, body)
        })
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a poisoned lock is still usable.
        self.write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate<F>(&self, op: &str, label: &str, apply: F) -> Result<MutationOutcome>
    where
        F: FnOnce(&str, &SectionSyntax) -> Result<Option<String>>,
    {
        let _guard = self.lock_writes();

        if !self.path.exists() {
            return Err(pbx_fs::Error::NotFound {
                path: self.path.clone(),
            }
            .into());
        }
        let _file_lock = FileLock::acquire(&self.path)?;

        let current = pbx_fs::read_text(&self.path)?;
        let updated = apply(&current, self.syntax()).map_err(|e| e.at_path(&self.path))?;

        let Some(updated) = updated.filter(|updated| *updated != current) else {
            tracing::debug!(op, label, file = %self.path.display(), "Section already up to date");
            return Ok(MutationOutcome::Unchanged);
        };

        let backup = pbx_fs::create_backup(&self.path)?;
        pbx_fs::write_text(&self.path, &updated)?;

        if let Some(keep) = self.options.max_backups
            && let Err(e) = pbx_fs::prune_backups(&self.path, keep)
        {
            tracing::warn!(file = %self.path.display(), error = %e, "Failed to prune old backups");
        }

        tracing::info!(op, label, file = %self.path.display(), "Updated configuration section");
        Ok(MutationOutcome::Written { backup })
    }
}
