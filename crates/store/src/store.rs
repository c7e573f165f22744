//! Record store abstraction

use crate::record::BackupRecord;
use anyhow::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use ulid::Ulid;

/// Storage for backup records.
///
/// Implementations must tolerate concurrent readers; `delete_by_id` on a
/// missing record is not an error so retention sweeps can be retried safely.
pub trait RecordStore: Send + Sync {
    /// Persist a new record.
    fn append(&self, record: &BackupRecord) -> Result<()>;

    /// All records for a backup name, oldest first.
    fn list_by_name(&self, name: &str) -> Result<Vec<BackupRecord>>;

    /// Remove a record. Missing IDs succeed silently.
    fn delete_by_id(&self, id: Ulid) -> Result<()>;

    /// Distinct backup names present in the store, sorted.
    fn names(&self) -> Result<Vec<String>>;
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Ulid, BackupRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: &BackupRecord) -> Result<()> {
        self.records.write().insert(record.id, record.clone());
        Ok(())
    }

    fn list_by_name(&self, name: &str) -> Result<Vec<BackupRecord>> {
        let records = self.records.read();
        let mut found: Vec<BackupRecord> = records
            .values()
            .filter(|r| r.name == name)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.ts_unix_ms, r.id));
        Ok(found)
    }

    fn delete_by_id(&self, id: Ulid) -> Result<()> {
        self.records.write().remove(&id);
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        let records = self.records.read();
        let mut names: Vec<String> = records.values().map(|r| r.name.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}
