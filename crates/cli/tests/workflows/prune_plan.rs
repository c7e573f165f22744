//! Prune planning workflow
//!
//! `vigil prune --dry-run` prints the partition of a name's records and
//! the real sweep executes it, so the two must agree on every record.

use crate::common::{day_ms, record_at};
use tempfile::TempDir;
use ulid::Ulid;
use vigil_store::{cleanup_for_name, partition, RecordDb, RecordStore, RetentionPolicy};

#[test]
fn test_sweep_matches_partition_plan() {
    let temp = TempDir::new().unwrap();
    let db = RecordDb::open(temp.path()).unwrap();

    // Two runs a day across two ISO weeks
    for day in [1, 2, 3, 8, 9, 10] {
        db.append(&record_at("docs", day_ms(2024, 1, day))).unwrap();
        db.append(&record_at("docs", day_ms(2024, 1, day) + 3_600_000))
            .unwrap();
    }

    let policy = RetentionPolicy {
        keep_daily: 4,
        keep_weekly: 2,
        keep_monthly: 1,
    };
    let plan = partition(&db.list_by_name("docs").unwrap(), &policy);
    assert!(!plan.deleted.is_empty());

    let stats = cleanup_for_name(&db, &policy, "docs");
    assert_eq!(stats.examined, 12);
    assert_eq!(stats.deleted, plan.deleted.len());
    assert_eq!(stats.kept, plan.kept.len());
    assert_eq!(stats.failed, 0);

    let remaining: Vec<Ulid> = db
        .list_by_name("docs")
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    let kept: Vec<Ulid> = plan.kept.iter().map(|r| r.id).collect();
    assert_eq!(remaining, kept);
}

#[test]
fn test_sweep_leaves_other_names_alone() {
    let temp = TempDir::new().unwrap();
    let db = RecordDb::open(temp.path()).unwrap();

    for day in 1..=5 {
        db.append(&record_at("docs", day_ms(2024, 1, day))).unwrap();
        db.append(&record_at("photos", day_ms(2024, 1, day)))
            .unwrap();
    }

    let policy = RetentionPolicy {
        keep_daily: 1,
        keep_weekly: 0,
        keep_monthly: 0,
    };
    let stats = cleanup_for_name(&db, &policy, "docs");

    assert_eq!(stats.deleted, 4);
    assert_eq!(db.list_by_name("docs").unwrap().len(), 1);
    assert_eq!(db.list_by_name("photos").unwrap().len(), 5);
}
