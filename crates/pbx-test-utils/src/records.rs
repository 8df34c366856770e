//! Record builders for tests.

use pbx_core::{ExtensionRecord, RuntimeSnapshot, Secret};

/// An enabled extension with a display name and secret derived from the
/// number, so rendered sections are complete.
pub fn extension(number: &str) -> ExtensionRecord {
    let mut record = ExtensionRecord::new(number);
    record.display_name = format!("User {number}");
    record.secret = Secret::new(format!("secret-{number}"));
    record
}

/// The snapshot a runtime reports after loading `record`.
pub fn snapshot_of(record: &ExtensionRecord) -> RuntimeSnapshot {
    RuntimeSnapshot::from_record(record)
}
