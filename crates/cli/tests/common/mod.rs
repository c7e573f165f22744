//! Common utilities for integration tests
//!
//! Scripted stand-ins for the two external collaborators (the change
//! notifier and the tool that copies bytes) so the pipeline tests never
//! touch rsync, tar, or a real platform watcher.

use anyhow::Result;
use async_trait::async_trait;
use chrono::TimeZone;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use ulid::Ulid;
use vigil_core::{BackupOptions, BackupRunner};
use vigil_store::BackupRecord;
use vigil_watcher::{ChangeEvent, ChangeKind, ChangeNotifier, WatchError, WatchHandle};

pub struct StubHandle;

impl WatchHandle for StubHandle {}

/// Notifier that hands its event channel to the test instead of watching
/// a real directory.
#[derive(Default)]
pub struct ScriptedNotifier {
    tx_slot: Mutex<Option<mpsc::UnboundedSender<ChangeEvent>>>,
}

impl ScriptedNotifier {
    /// The event sender, once the session has started watching.
    pub async fn sender(&self) -> mpsc::UnboundedSender<ChangeEvent> {
        loop {
            if let Some(tx) = self.tx_slot.lock().clone() {
                return tx;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl ChangeNotifier for ScriptedNotifier {
    async fn start_watch(
        &self,
        _path: &Path,
        _recursive: bool,
        events: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Box<dyn WatchHandle>, WatchError> {
        *self.tx_slot.lock() = Some(events);
        Ok(Box::new(StubHandle))
    }
}

/// Runner that succeeds instantly and counts its calls.
#[derive(Default)]
pub struct CountingRunner {
    pub runs: AtomicUsize,
}

#[async_trait]
impl BackupRunner for CountingRunner {
    async fn run_backup(
        &self,
        _source: &Path,
        _name: &str,
        _options: &BackupOptions,
    ) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A plain file-modified event.
pub fn change(path: &str) -> ChangeEvent {
    ChangeEvent::new(path, ChangeKind::Modified)
}

/// A backup record pinned to a specific wall-clock time.
pub fn record_at(name: &str, ts_unix_ms: u64) -> BackupRecord {
    BackupRecord {
        id: Ulid::new(),
        name: name.to_string(),
        ts_unix_ms,
        source: "/src".into(),
        destination: "/dst".into(),
        duration_ms: 1,
    }
}

/// Unix milliseconds for 08:00 UTC on the given day.
pub fn day_ms(year: i32, month: u32, day: u32) -> u64 {
    chrono::Utc
        .with_ymd_and_hms(year, month, day, 8, 0, 0)
        .unwrap()
        .timestamp_millis() as u64
}

/// Poll until the condition holds or the limit elapses.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
