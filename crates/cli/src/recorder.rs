//! Record-keeping around backup runs
//!
//! `RecordingRunner` wraps the runner that actually copies bytes: every
//! successful run appends a record to the store and kicks off a retention
//! sweep for that name in the background, so pruning never delays the run
//! or the watch session that requested it.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vigil_core::{destination_for, BackupOptions, BackupRunner};
use vigil_store::{cleanup_for_name, BackupRecord, RecordStore, RetentionPolicy};

/// Backup runner that records completed runs and prunes old ones.
pub struct RecordingRunner {
    inner: Arc<dyn BackupRunner>,
    store: Arc<dyn RecordStore>,
    policy: RetentionPolicy,
    /// Sweeps still running in the background
    sweeps: Mutex<Vec<JoinHandle<()>>>,
}

impl RecordingRunner {
    pub fn new(
        inner: Arc<dyn BackupRunner>,
        store: Arc<dyn RecordStore>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            inner,
            store,
            policy,
            sweeps: Mutex::new(Vec::new()),
        }
    }

    /// Wait for background sweeps to land.
    ///
    /// One-shot commands call this before exiting so the process does not
    /// quit with a sweep half done; a long-running watch calls it once on
    /// the way out.
    pub async fn finish_sweeps(&self) {
        let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.sweeps.lock());
        for handle in pending {
            let _ = handle.await;
        }
    }

    fn spawn_sweep(&self, name: &str) {
        let store = self.store.clone();
        let policy = self.policy;
        let name = name.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            cleanup_for_name(store.as_ref(), &policy, &name);
        });

        let mut sweeps = self.sweeps.lock();
        sweeps.retain(|h| !h.is_finished());
        sweeps.push(handle);
    }
}

#[async_trait]
impl BackupRunner for RecordingRunner {
    async fn run_backup(&self, source: &Path, name: &str, options: &BackupOptions) -> Result<()> {
        let started = Instant::now();
        self.inner.run_backup(source, name, options).await?;

        let record = BackupRecord::new(
            name,
            source,
            destination_for(&options.destination_root, name),
            started.elapsed().as_millis() as u64,
        );

        // The bytes are already safe at this point; a record-keeping
        // failure must not turn the run into a failed one.
        if let Err(e) = self.store.append(&record) {
            warn!("Failed to record backup '{}': {:#}", name, e);
            return Ok(());
        }
        debug!("Recorded backup '{}' as {}", name, record.id);

        self.spawn_sweep(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use ulid::Ulid;
    use vigil_store::MemoryStore;

    #[derive(Default)]
    struct StubRunner {
        runs: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl BackupRunner for StubRunner {
        async fn run_backup(
            &self,
            _source: &Path,
            _name: &str,
            _options: &BackupOptions,
        ) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                bail!("simulated failure");
            }
            Ok(())
        }
    }

    fn keep_everything() -> RetentionPolicy {
        RetentionPolicy {
            keep_daily: 10_000,
            keep_weekly: 10_000,
            keep_monthly: 10_000,
        }
    }

    #[tokio::test]
    async fn test_successful_run_is_recorded() {
        let store = Arc::new(MemoryStore::new());
        let recorder = RecordingRunner::new(
            Arc::new(StubRunner::default()),
            store.clone(),
            keep_everything(),
        );

        recorder
            .run_backup(Path::new("/home/user/docs"), "docs", &BackupOptions::new("/backups"))
            .await
            .unwrap();
        recorder.finish_sweeps().await;

        let records = store.list_by_name("docs").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, Path::new("/home/user/docs"));
        assert_eq!(records[0].destination, Path::new("/backups/docs"));
    }

    #[tokio::test]
    async fn test_failed_run_is_not_recorded() {
        let store = Arc::new(MemoryStore::new());
        let runner = Arc::new(StubRunner::default());
        runner.fail.store(true, Ordering::SeqCst);
        let recorder = RecordingRunner::new(runner.clone(), store.clone(), keep_everything());

        let result = recorder
            .run_backup(Path::new("/src"), "docs", &BackupOptions::new("/backups"))
            .await;

        assert!(result.is_err());
        assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
        assert!(store.list_by_name("docs").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_prunes_old_records_after_run() {
        let store = Arc::new(MemoryStore::new());
        // Records from long-gone days that the policy no longer covers
        for day in 1..=3 {
            store
                .append(&BackupRecord {
                    id: Ulid::new(),
                    name: "docs".to_string(),
                    ts_unix_ms: 1_700_000_000_000 + day * 86_400_000,
                    source: "/src".into(),
                    destination: "/dst".into(),
                    duration_ms: 1,
                })
                .unwrap();
        }

        let policy = RetentionPolicy {
            keep_daily: 1,
            keep_weekly: 0,
            keep_monthly: 0,
        };
        let recorder =
            RecordingRunner::new(Arc::new(StubRunner::default()), store.clone(), policy);

        recorder
            .run_backup(Path::new("/src"), "docs", &BackupOptions::new("/backups"))
            .await
            .unwrap();
        recorder.finish_sweeps().await;

        // Only today's bucket survives, represented by the fresh record
        let remaining = store.list_by_name("docs").unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].ts_unix_ms > 1_701_000_000_000);
    }

    #[tokio::test]
    async fn test_finish_sweeps_without_runs_is_noop() {
        let recorder = RecordingRunner::new(
            Arc::new(StubRunner::default()),
            Arc::new(MemoryStore::new()),
            keep_everything(),
        );
        recorder.finish_sweeps().await;
    }
}
