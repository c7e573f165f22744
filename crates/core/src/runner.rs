//! Backup runner capability
//!
//! The watcher decides *when* to back up; something else decides *how*. That
//! something implements [`BackupRunner`] — typically a wrapper around an
//! external sync or archive tool (see the `vigil-sync` crate), or a mock in
//! tests.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Options passed through to a backup attempt.
///
/// Every call to [`BackupRunner::run_backup`] is a complete, self-contained
/// attempt; the options carry everything the runner needs beyond the source
/// path and logical name.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// Root directory under which per-name destinations live.
    pub destination_root: PathBuf,
    /// Directory base-name patterns the runner should skip.
    pub exclude_dirs: Vec<String>,
    /// File base-name patterns the runner should skip.
    pub exclude_files: Vec<String>,
    /// Extra arguments forwarded verbatim to the underlying tool.
    pub extra_args: Vec<String>,
}

impl BackupOptions {
    /// Options with no exclusions for the given destination root.
    pub fn new(destination_root: impl Into<PathBuf>) -> Self {
        Self {
            destination_root: destination_root.into(),
            exclude_dirs: Vec::new(),
            exclude_files: Vec::new(),
            extra_args: Vec::new(),
        }
    }
}

/// Capability to perform one backup run.
///
/// Implementations must be idempotent-safe: calling `run_backup` repeatedly
/// with the same arguments may redo work but never corrupts the destination.
/// A returned error means this attempt failed; the caller decides whether and
/// when to retry.
#[async_trait]
pub trait BackupRunner: Send + Sync {
    /// Run one complete backup of `source` under the logical name `name`.
    async fn run_backup(&self, source: &Path, name: &str, options: &BackupOptions) -> Result<()>;
}
