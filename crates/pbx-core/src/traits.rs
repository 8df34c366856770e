//! Collaborator contracts consumed by the engine.
//!
//! The engine never talks to a database, a telephony server or a renderer
//! directly; it goes through these traits so each side can be swapped.

use crate::error::{ReloadError, Result};
use crate::model::{ExtensionRecord, RuntimeSnapshot};

/// Label prefix of per-extension sections, as in `Extension 101`.
pub const DEFAULT_LABEL_PREFIX: &str = "Extension";

/// Section label for an extension number under `prefix`.
pub fn section_label(prefix: &str, number: &str) -> String {
    format!("{} {}", prefix, number)
}

/// The administrator's declared extension records.
pub trait DeclaredStore: Send + Sync {
    fn list_all(&self) -> Result<Vec<ExtensionRecord>>;

    /// Insert the record, or replace the one with the same number.
    fn upsert(&self, record: ExtensionRecord) -> Result<()>;

    /// Delete the record. Returns `false` if it did not exist.
    fn remove(&self, number: &str) -> Result<bool>;

    fn get(&self, number: &str) -> Result<Option<ExtensionRecord>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|record| record.number == number))
    }
}

/// The telephony server's live view of its extensions.
pub trait RuntimeProbe: Send + Sync {
    fn snapshot(&self) -> Result<Vec<RuntimeSnapshot>>;

    fn lookup(&self, number: &str) -> Result<Option<RuntimeSnapshot>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .find(|snapshot| snapshot.number == number))
    }

    fn is_registered(&self, number: &str) -> Result<bool> {
        Ok(self.lookup(number)?.is_some_and(|snapshot| snapshot.registered))
    }
}

/// Turns a declared record into the section body written to the config file.
pub trait ConfigRenderer: Send + Sync {
    fn render_section(&self, record: &ExtensionRecord) -> String;

    fn section_label(&self, number: &str) -> String {
        section_label(DEFAULT_LABEL_PREFIX, number)
    }
}

/// Asks the telephony server to re-read its configuration.
pub trait ReloadTrigger: Send + Sync {
    fn reload(&self) -> std::result::Result<(), ReloadError>;
}
