//! Watch a directory and back up on changes

use crate::locks::WatchLock;
use crate::recorder::RecordingRunner;
use crate::{system_config, util};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vigil_core::backup_name_for;
use vigil_store::RecordDb;
use vigil_watcher::{supervisor, NotifyWatcher, WatchConfig, WatchSession};

pub async fn run(path: PathBuf, name: Option<String>, duration: Option<u64>) -> Result<()> {
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

    // 2. One watcher per source directory
    let lock = WatchLock::acquire(&util::locks_dir()?, &source)?;

    // 3. Record store and the recording runner
    let store = Arc::new(
        RecordDb::open(&util::records_dir()?).context("Failed to open record database")?,
    );
    let runner = Arc::new(RecordingRunner::new(
        util::runner_for_mode(config.backup.mode),
        store,
        config.retention.policy(),
    ));

    // 4. A session with the configured timings and exclusions
    let mut watch_config = WatchConfig::new(&source, &name, config.backup_options());
    watch_config.wait_after_changes = config.wait_after_changes();
    watch_config.min_backup_interval = config.min_backup_interval();
    watch_config.exclude_dirs = config.watch.exclude_dirs.clone();
    watch_config.exclude_files = config.watch.exclude_files.clone();

    let session = Arc::new(WatchSession::new(
        watch_config,
        Arc::new(NotifyWatcher),
        runner.clone(),
    )?);

    println!(
        "Watching {} (backup '{}', {} mode)",
        source.display().to_string().cyan(),
        name.yellow(),
        config.backup.mode
    );

    // 5. Run under the supervisor until the window ends or Ctrl-C
    let result = match duration {
        Some(secs) => {
            println!("  Stopping automatically after {}s", secs);
            supervisor::run_for(session, Duration::from_secs(secs)).await
        }
        None => {
            println!("  {}", "Press Ctrl-C to stop".dimmed());
            supervisor::run_until_signaled(session, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
        }
    };

    // 6. Let in-flight sweeps land, then release the source
    runner.finish_sweeps().await;
    lock.release()?;

    println!("{} Watch for '{}' stopped", "✓".green(), name.yellow());
    result
}
