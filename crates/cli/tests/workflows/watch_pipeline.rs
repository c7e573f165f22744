//! Watch pipeline workflow
//!
//! Drives a real `WatchSession` over the durable record database through
//! the recording runner, so one test covers the whole chain a `vigil
//! watch` command wires up: change events in, coalesced backup runs out,
//! records appended, and old records swept behind each run.

use crate::common::{change, day_ms, record_at, wait_until, CountingRunner, ScriptedNotifier};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vigil_cli::recorder::RecordingRunner;
use vigil_core::BackupOptions;
use vigil_store::{RecordDb, RecordStore, RetentionPolicy};
use vigil_watcher::supervisor;
use vigil_watcher::{WatchConfig, WatchSession};

fn fast_config(wait_ms: u64) -> WatchConfig {
    let mut cfg = WatchConfig::new("/watch", "docs", BackupOptions::new("/backups"));
    cfg.wait_after_changes = Duration::from_millis(wait_ms);
    cfg.min_backup_interval = Duration::from_millis(0);
    cfg
}

#[tokio::test]
async fn test_watch_pipeline_records_and_prunes() {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(RecordDb::open(temp.path()).unwrap());

    // Pre-existing runs on three consecutive days; the policy below keeps
    // two distinct days, and today will be one of them
    let seeds = [
        record_at("docs", day_ms(2024, 3, 1)),
        record_at("docs", day_ms(2024, 3, 2)),
        record_at("docs", day_ms(2024, 3, 3)),
    ];
    for seed in &seeds {
        db.append(seed).unwrap();
    }

    let policy = RetentionPolicy {
        keep_daily: 2,
        keep_weekly: 0,
        keep_monthly: 0,
    };
    let runner = Arc::new(CountingRunner::default());
    let recorder = Arc::new(RecordingRunner::new(runner.clone(), db.clone(), policy));
    let notifier = Arc::new(ScriptedNotifier::default());

    let session = Arc::new(
        WatchSession::new(fast_config(50), notifier.clone(), recorder.clone()).unwrap(),
    );
    let handle = tokio::spawn(session.clone().start());

    // Baseline first, then one coalesced run for a burst of changes
    let tx = notifier.sender().await;
    assert!(wait_until(Duration::from_secs(2), || {
        runner.runs.load(Ordering::SeqCst) == 1
    })
    .await);
    for file in ["a.rs", "b.rs", "c.rs"] {
        tx.send(change(&format!("/watch/src/{}", file))).unwrap();
    }
    assert!(wait_until(Duration::from_secs(2), || {
        runner.runs.load(Ordering::SeqCst) == 2
    })
    .await);

    session.stop();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    recorder.finish_sweeps().await;

    // Each run swept behind itself: the two oldest days are gone and
    // today's bucket collapsed to its earliest record, the baseline.
    let remaining = db.list_by_name("docs").unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].id, seeds[2].id);
    assert!(remaining[1].ts_unix_ms > seeds[2].ts_unix_ms);
    assert!(!seeds.iter().any(|s| s.id == remaining[1].id));
}

#[tokio::test]
async fn test_bounded_watch_leaves_a_baseline_record() {
    let temp = TempDir::new().unwrap();
    let db = Arc::new(RecordDb::open(temp.path()).unwrap());
    let runner = Arc::new(CountingRunner::default());
    let recorder = Arc::new(RecordingRunner::new(
        runner.clone(),
        db.clone(),
        RetentionPolicy::default(),
    ));
    let notifier = Arc::new(ScriptedNotifier::default());
    let session =
        Arc::new(WatchSession::new(fast_config(50), notifier, recorder.clone()).unwrap());

    tokio::time::timeout(
        Duration::from_secs(5),
        supervisor::run_for(session, Duration::from_millis(250)),
    )
    .await
    .unwrap()
    .unwrap();
    recorder.finish_sweeps().await;

    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
    let records = db.list_by_name("docs").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "docs");
    assert_eq!(records[0].destination, std::path::Path::new("/backups/docs"));
}
