//! Backup record data structures

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ulid::Ulid;
use vigil_core::now_unix_ms;

/// One completed backup run for a logical backup name.
///
/// Records are immutable once written; `name` groups every run of the same
/// source directory and `ts_unix_ms` orders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Unique ID (ULID for timestamp + uniqueness)
    pub id: Ulid,
    /// Logical backup name this record belongs to
    pub name: String,
    /// Completion time (Unix milliseconds)
    pub ts_unix_ms: u64,
    /// Source directory that was backed up
    pub source: PathBuf,
    /// Destination the run wrote into
    pub destination: PathBuf,
    /// Wall-clock duration of the run
    pub duration_ms: u64,
}

impl BackupRecord {
    /// Create a record for a run that just completed.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            ts_unix_ms: now_unix_ms(),
            source: source.into(),
            destination: destination.into(),
            duration_ms,
        }
    }

    /// Serialize for storage.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to serialize backup record")
    }

    /// Deserialize from storage.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to deserialize backup record")
    }
}
