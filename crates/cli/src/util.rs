//! Shared utilities for CLI commands

use crate::system_config::BackupMode;
use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use ulid::Ulid;
use vigil_core::BackupRunner;
use vigil_sync::{ArchiveRunner, RsyncRunner};

/// Root directory for vigil's own state (record database, watch locks).
///
/// `VIGIL_STATE_DIR` overrides the platform data directory.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("VIGIL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("vigil"))
        .context("Could not determine data directory")
}

/// Where the record database lives.
pub fn records_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("records"))
}

/// Where per-source watch locks live.
pub fn locks_dir() -> Result<PathBuf> {
    Ok(state_dir()?.join("locks"))
}

/// The external tool wrapper for the configured backup mode.
pub fn runner_for_mode(mode: BackupMode) -> Arc<dyn BackupRunner> {
    match mode {
        BackupMode::Sync => Arc::new(RsyncRunner::new()),
        BackupMode::Archive => Arc::new(ArchiveRunner::new()),
    }
}

/// Short display form of a record ID.
pub fn short_id(id: &Ulid) -> String {
    id.to_string()[..8].to_string()
}

/// Format a timestamp as relative time ("2 hours ago").
pub fn format_relative_time(ts_ms: u64) -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    let datetime = UNIX_EPOCH + Duration::from_millis(ts_ms);

    if let Ok(elapsed) = SystemTime::now().duration_since(datetime) {
        let seconds = elapsed.as_secs();

        if seconds < 60 {
            format!("{} seconds ago", seconds)
        } else if seconds < 3600 {
            format!("{} minutes ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{} hours ago", seconds / 3600)
        } else if seconds < 604800 {
            format!("{} days ago", seconds / 86400)
        } else {
            format!("{} weeks ago", seconds / 604800)
        }
    } else {
        "in the future".to_string()
    }
}

/// Format a timestamp as absolute UTC time ("2024-01-03 14:30:00").
pub fn format_absolute_time(ts_ms: u64) -> String {
    match Utc.timestamp_millis_opt(ts_ms as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Format a wall-clock duration ("850 ms", "12.3 s", "2m 05s").
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{} ms", ms)
    } else if ms < 60_000 {
        format!("{:.1} s", ms as f64 / 1000.0)
    } else {
        format!("{}m {:02}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_relative_time() {
        use std::time::{SystemTime, UNIX_EPOCH};

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        let result = format_relative_time(now_ms);
        assert!(result.contains("seconds ago"));

        let one_hour_ago = now_ms - (3600 * 1000);
        assert!(format_relative_time(one_hour_ago).contains("hour"));

        let one_day_ago = now_ms - (86400 * 1000);
        assert!(format_relative_time(one_day_ago).contains("day"));
    }

    #[test]
    fn test_format_absolute_time() {
        // 2024-03-01 08:30:00 UTC
        assert_eq!(format_absolute_time(1_709_281_800_000), "2024-03-01 08:30:00");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(0), "0 ms");
        assert_eq!(format_duration_ms(850), "850 ms");
        assert_eq!(format_duration_ms(12_300), "12.3 s");
        assert_eq!(format_duration_ms(125_000), "2m 05s");
    }

    #[test]
    fn test_short_id_is_prefix() {
        let id = Ulid::new();
        let short = short_id(&id);
        assert_eq!(short.len(), 8);
        assert!(id.to_string().starts_with(&short));
    }
}
