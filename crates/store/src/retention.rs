//! Tiered retention over backup records
//!
//! A grandfather-father-son scheme: records are pruned to one per calendar
//! day, the survivors to one per ISO week, and those survivors to one per
//! month. Each tier is capped to its most recent N buckets.

use crate::record::BackupRecord;
use crate::store::RecordStore;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use ulid::Ulid;

/// Keep counts per tier. Zero means the tier keeps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep_daily: u32,
    pub keep_weekly: u32,
    pub keep_monthly: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_daily: 7,
            keep_weekly: 4,
            keep_monthly: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Daily,
    Weekly,
    Monthly,
}

/// Calendar bucket a timestamp falls into for one tier.
fn bucket_key(tier: Tier, ts_unix_ms: u64) -> (i32, u32) {
    let dt: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts_unix_ms as i64)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    match tier {
        Tier::Daily => (dt.year(), dt.ordinal()),
        Tier::Weekly => {
            let week = dt.iso_week();
            (week.year(), week.week())
        }
        Tier::Monthly => (dt.year(), dt.month()),
    }
}

/// One tier pass over records sorted by timestamp ascending.
///
/// Keeps the earliest record of each distinct calendar bucket, then drops
/// the oldest buckets until at most `keep` remain.
fn tier_survivors(sorted: &[BackupRecord], tier: Tier, keep: u32) -> Vec<BackupRecord> {
    if keep == 0 {
        return Vec::new();
    }

    let mut survivors: Vec<BackupRecord> = Vec::new();
    let mut last_bucket = None;

    for record in sorted {
        let bucket = bucket_key(tier, record.ts_unix_ms);
        if last_bucket != Some(bucket) {
            survivors.push(record.clone());
            last_bucket = Some(bucket);
        }
    }

    let excess = survivors.len().saturating_sub(keep as usize);
    survivors.split_off(excess)
}

/// Outcome of partitioning one name's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    pub kept: Vec<BackupRecord>,
    pub deleted: Vec<BackupRecord>,
}

/// Partition records into kept and deleted sets.
///
/// The daily pass runs over all records, the weekly pass over the daily
/// survivors, and the monthly pass over the weekly survivors. A record kept
/// by any tier is preserved; ties on timestamp are broken by record ID so
/// the outcome is deterministic.
pub fn partition(records: &[BackupRecord], policy: &RetentionPolicy) -> RetentionPlan {
    let mut sorted: Vec<BackupRecord> = records.to_vec();
    sorted.sort_by_key(|r| (r.ts_unix_ms, r.id));

    let daily = tier_survivors(&sorted, Tier::Daily, policy.keep_daily);
    let weekly = tier_survivors(&daily, Tier::Weekly, policy.keep_weekly);
    let monthly = tier_survivors(&weekly, Tier::Monthly, policy.keep_monthly);

    let mut kept_ids: HashSet<Ulid> = HashSet::new();
    for record in daily.iter().chain(&weekly).chain(&monthly) {
        kept_ids.insert(record.id);
    }

    let (kept, deleted) = sorted.into_iter().partition(|r| kept_ids.contains(&r.id));

    RetentionPlan { kept, deleted }
}

/// Counters from one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub examined: usize,
    pub kept: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Prune old records for one backup name.
///
/// Never fails: sweeps run behind successful backups and must not bubble
/// anything back into that path. A listing failure is logged and yields
/// empty stats; a failed delete is logged and counted while the rest of
/// the sweep proceeds. A record that vanished between the listing and the
/// delete counts as deleted.
pub fn cleanup_for_name(
    store: &dyn RecordStore,
    policy: &RetentionPolicy,
    name: &str,
) -> SweepStats {
    let records = match store.list_by_name(name) {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to list records for '{}': {:#}", name, e);
            return SweepStats::default();
        }
    };
    let plan = partition(&records, policy);

    let mut stats = SweepStats {
        examined: records.len(),
        kept: plan.kept.len(),
        ..Default::default()
    };

    for record in &plan.deleted {
        match store.delete_by_id(record.id) {
            Ok(()) => stats.deleted += 1,
            Err(e) => {
                stats.failed += 1;
                warn!("Failed to delete record {} for '{}': {:#}", record.id, name, e);
            }
        }
    }

    debug!(
        "Retention sweep for '{}': examined {}, kept {}, deleted {}, failed {}",
        name, stats.examined, stats.kept, stats.deleted, stats.failed
    );

    stats
}
