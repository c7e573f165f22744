//! Sled-backed record store

use crate::record::BackupRecord;
use crate::store::RecordStore;
use anyhow::Result;
use parking_lot::RwLock;
use sled::Db;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use ulid::Ulid;

/// Durable record store using sled.
///
/// Records are keyed by ULID bytes. A name index is rebuilt on open so
/// lookups by backup name never scan the database.
pub struct RecordDb {
    /// Sled database
    db: Db,
    /// In-memory index: backup name -> record IDs
    index: RwLock<HashMap<String, BTreeSet<Ulid>>>,
}

impl RecordDb {
    /// Open or create a record database at the given directory.
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::open(path.join("records.db"))?;

        // Build in-memory index on startup
        let mut index: HashMap<String, BTreeSet<Ulid>> = HashMap::new();

        for item in db.iter() {
            let (_key, value) = item?;
            let record = BackupRecord::deserialize(&value)?;
            index.entry(record.name).or_default().insert(record.id);
        }

        Ok(Self {
            db,
            index: RwLock::new(index),
        })
    }
}

impl RecordStore for RecordDb {
    fn append(&self, record: &BackupRecord) -> Result<()> {
        let key = record.id.to_bytes();
        let value = record.serialize()?;

        self.db.insert(key, value)?;

        // Update index
        self.index
            .write()
            .entry(record.name.clone())
            .or_default()
            .insert(record.id);

        // Flush to ensure durability
        self.db.flush()?;

        Ok(())
    }

    fn list_by_name(&self, name: &str) -> Result<Vec<BackupRecord>> {
        let ids: Vec<Ulid> = match self.index.read().get(name) {
            Some(ids) => ids.iter().copied().collect(),
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            // Index entries without a backing row are skipped rather than
            // failing the whole listing.
            if let Some(value) = self.db.get(id.to_bytes())? {
                records.push(BackupRecord::deserialize(&value)?);
            }
        }

        records.sort_by_key(|r| (r.ts_unix_ms, r.id));
        Ok(records)
    }

    fn delete_by_id(&self, id: Ulid) -> Result<()> {
        {
            let mut index = self.index.write();
            for ids in index.values_mut() {
                ids.remove(&id);
            }
            index.retain(|_, ids| !ids.is_empty());
        }

        self.db.remove(id.to_bytes())?;
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.index.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
