use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use pbx_fs::FileLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ExtensionRecord, compare_numbers};
use crate::traits::DeclaredStore;

const FORMAT_VERSION: &str = "1.0";

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// On-disk layout of the declared records file
#[derive(Debug, Serialize, Deserialize)]
struct DeclaredFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default, rename = "extension")]
    extensions: Vec<ExtensionRecord>,
}

impl Default for DeclaredFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            extensions: Vec::new(),
        }
    }
}

/// Declared records persisted as `[[extension]]` tables in a TOML file.
///
/// ```toml
/// version = "1.0"
///
/// [[extension]]
/// number = "101"
/// display_name = "Alice"
/// secret = "s3cret"
/// codecs = ["ulaw", "alaw"]
/// ```
///
/// A missing file reads as an empty store and is created by the first
/// write. Writes are atomic and hold an exclusive lock on a sibling
/// `.lock` file for the whole read-modify-write.
#[derive(Debug)]
pub struct TomlDeclaredStore {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl TomlDeclaredStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<DeclaredFile> {
        match pbx_fs::read_text(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(pbx_fs::Error::NotFound { .. }) => Ok(DeclaredFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, file: &mut DeclaredFile) -> Result<()> {
        file.extensions
            .sort_by(|a, b| compare_numbers(&a.number, &b.number));
        let content = toml::to_string_pretty(file)?;
        pbx_fs::write_text(&self.path, &content)?;
        Ok(())
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `change` on the current records under both locks; save if it
    /// returns `true`.
    fn modify<F>(&self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<ExtensionRecord>) -> bool,
    {
        let _guard = self.lock_writes();
        let _lock = FileLock::acquire(&self.path)?;

        let mut file = self.load()?;
        if !change(&mut file.extensions) {
            return Ok(false);
        }
        self.save(&mut file)?;
        Ok(true)
    }
}

impl DeclaredStore for TomlDeclaredStore {
    fn list_all(&self) -> Result<Vec<ExtensionRecord>> {
        Ok(self.load()?.extensions)
    }

    fn upsert(&self, record: ExtensionRecord) -> Result<()> {
        let number = record.number.clone();
        self.modify(|records| {
            match records.iter_mut().find(|r| r.number == record.number) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
            true
        })?;
        tracing::debug!(number = %number, file = %self.path.display(), "Saved declared record");
        Ok(())
    }

    fn remove(&self, number: &str) -> Result<bool> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| r.number != number);
            records.len() != before
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::Secret;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = TomlDeclaredStore::new(dir.path().join("extensions.toml"));
        assert!(store.list_all().unwrap().is_empty());
        assert!(!store.remove("101").unwrap());
        assert!(!dir.path().join("extensions.toml").exists());
    }

    #[test]
    fn test_upsert_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extensions.toml");
        let store = TomlDeclaredStore::new(&path);

        let mut record = ExtensionRecord::new("101");
        record.secret = Secret::new("pw");
        record.codecs = vec!["g722".into(), "ulaw".into()];
        store.upsert(record.clone()).unwrap();
        store.upsert(ExtensionRecord::new("99")).unwrap();

        let reopened = TomlDeclaredStore::new(&path);
        let records = reopened.list_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].number, "99");
        assert_eq!(records[1], record);
    }

    #[test]
    fn test_first_write_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbx-sync").join("extensions.toml");
        let store = TomlDeclaredStore::new(&path);

        store.upsert(ExtensionRecord::new("101")).unwrap();

        assert!(path.exists());
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extensions.toml");
        fs::write(&path, "[[extension]]\nnumber = \"200\"\n").unwrap();

        let record = TomlDeclaredStore::new(&path).get("200").unwrap().unwrap();
        assert_eq!(record.context, "from-internal");
        assert_eq!(record.codecs, vec!["ulaw".to_string()]);
        assert!(record.enabled);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extensions.toml");
        fs::write(&path, "[[extension]\n").unwrap();

        let err = TomlDeclaredStore::new(&path).list_all().unwrap_err();
        assert!(matches!(err, Error::TomlDe(_)));
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let store = TomlDeclaredStore::new(dir.path().join("extensions.toml"));
        store.upsert(ExtensionRecord::new("101")).unwrap();
        assert!(store.remove("101").unwrap());
        assert!(store.list_all().unwrap().is_empty());
    }
}
