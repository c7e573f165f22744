//! List recorded backups for a name

use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use vigil_store::{RecordDb, RecordStore};

pub async fn run(name: String, limit: Option<usize>, json: bool) -> Result<()> {
    let store = RecordDb::open(&util::records_dir()?).context("Failed to open record database")?;

    let mut records = store.list_by_name(&name)?;

    // Most recent K, still printed oldest first
    if let Some(limit) = limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", format!("No backups recorded for '{}'", name).dimmed());
        return Ok(());
    }

    println!("{} '{}'", "Backups for".bold(), name.yellow().bold());
    for record in &records {
        println!(
            "  {}  {}  {} {}",
            util::short_id(&record.id).yellow(),
            util::format_absolute_time(record.ts_unix_ms),
            util::format_relative_time(record.ts_unix_ms).dimmed(),
            format!("({})", util::format_duration_ms(record.duration_ms)).dimmed()
        );
    }
    println!("\n{} total", records.len());

    Ok(())
}
