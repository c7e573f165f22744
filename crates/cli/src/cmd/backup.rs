//! Run one backup immediately

use crate::recorder::RecordingRunner;
use crate::{system_config, util};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use vigil_core::{backup_name_for, BackupRunner};
use vigil_store::RecordDb;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    // 1. Load configuration and resolve the source
    let config = system_config::load()?;
    let source = path
        .canonicalize()
        .with_context(|| format!("Source directory {} not found", path.display()))?;
    anyhow::ensure!(
        source.is_dir(),
        "Source {} is not a directory",
        source.display()
    );
    let name = name.unwrap_or_else(|| backup_name_for(&source));

    // 2. Open the record store
    let store = Arc::new(
        RecordDb::open(&util::records_dir()?).context("Failed to open record database")?,
    );

    // 3. Compose the configured tool with record-keeping
    let runner = RecordingRunner::new(
        util::runner_for_mode(config.backup.mode),
        store,
        config.retention.policy(),
    );

    println!(
        "Backing up {} as '{}' ({} mode)",
        source.display().to_string().cyan(),
        name.yellow(),
        config.backup.mode
    );

    // 4. One complete, self-contained attempt
    let started = Instant::now();
    runner
        .run_backup(&source, &name, &config.backup_options())
        .await?;

    println!(
        "{} Backup '{}' completed in {}",
        "✓".green(),
        name.yellow(),
        util::format_duration_ms(started.elapsed().as_millis() as u64)
    );

    // 5. Let the retention sweep land before the process exits
    runner.finish_sweeps().await;

    Ok(())
}
