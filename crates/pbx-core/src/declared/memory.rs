use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::model::{ExtensionRecord, NumberKey};
use crate::traits::DeclaredStore;

/// Declared records held in memory, listed in number order.
#[derive(Debug, Default)]
pub struct MemoryDeclaredStore {
    records: Mutex<BTreeMap<NumberKey, ExtensionRecord>>,
}

impl MemoryDeclaredStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `records`; a later duplicate replaces an earlier one.
    pub fn with_records(records: impl IntoIterator<Item = ExtensionRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (NumberKey(record.number.clone()), record))
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<NumberKey, ExtensionRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DeclaredStore for MemoryDeclaredStore {
    fn list_all(&self) -> Result<Vec<ExtensionRecord>> {
        Ok(self.records().values().cloned().collect())
    }

    fn upsert(&self, record: ExtensionRecord) -> Result<()> {
        self.records()
            .insert(NumberKey(record.number.clone()), record);
        Ok(())
    }

    fn remove(&self, number: &str) -> Result<bool> {
        Ok(self
            .records()
            .remove(&NumberKey(number.to_string()))
            .is_some())
    }

    fn get(&self, number: &str) -> Result<Option<ExtensionRecord>> {
        Ok(self.records().get(&NumberKey(number.to_string())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_get_remove() {
        let store = MemoryDeclaredStore::new();
        store.upsert(ExtensionRecord::new("101")).unwrap();

        let mut updated = ExtensionRecord::new("101");
        updated.context = "sales".into();
        store.upsert(updated).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 1);
        assert_eq!(store.get("101").unwrap().unwrap().context, "sales");
        assert!(store.remove("101").unwrap());
        assert!(!store.remove("101").unwrap());
        assert!(store.get("101").unwrap().is_none());
    }

    #[test]
    fn test_listed_in_number_order() {
        let store = MemoryDeclaredStore::with_records([
            ExtensionRecord::new("1000"),
            ExtensionRecord::new("20"),
        ]);
        let numbers: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|r| r.number)
            .collect();
        assert_eq!(numbers, vec!["20", "1000"]);
    }
}
