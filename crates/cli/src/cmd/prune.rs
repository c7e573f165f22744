//! Delete old backups per the retention policy

use crate::{system_config, util};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use vigil_store::{cleanup_for_name, partition, RecordDb, RecordStore, RetentionPolicy};

pub async fn run(name: Option<String>, all: bool, dry_run: bool) -> Result<()> {
    // 1. Load the policy and open the store
    let config = system_config::load()?;
    let store = RecordDb::open(&util::records_dir()?).context("Failed to open record database")?;
    let policy = config.retention.policy();

    // 2. Which names to sweep
    let names = match name {
        Some(name) => vec![name],
        None if all => store.names()?,
        None => anyhow::bail!("Specify a backup name or use --all"),
    };

    if names.is_empty() {
        println!("{}", "No backups recorded yet".dimmed());
        return Ok(());
    }

    println!(
        "Retention policy: {} daily, {} weekly, {} monthly",
        policy.keep_daily, policy.keep_weekly, policy.keep_monthly
    );

    // 3. Sweep (or just show the plan)
    for name in &names {
        if dry_run {
            print_plan(&store, &policy, name)?;
        } else {
            let stats = cleanup_for_name(&store, &policy, name);
            let failures = if stats.failed > 0 {
                format!(", {} failed", stats.failed).red().to_string()
            } else {
                String::new()
            };
            println!(
                "{} '{}': kept {}, deleted {}{}",
                "✓".green(),
                name.yellow(),
                stats.kept,
                stats.deleted,
                failures
            );
        }
    }

    Ok(())
}

/// Show what a sweep would delete, without touching anything.
fn print_plan(store: &RecordDb, policy: &RetentionPolicy, name: &str) -> Result<()> {
    let records = store
        .list_by_name(name)
        .with_context(|| format!("Failed to list records for '{}'", name))?;
    let plan = partition(&records, policy);

    println!(
        "\n'{}': {} records, would keep {}, delete {}",
        name.yellow(),
        records.len(),
        plan.kept.len(),
        plan.deleted.len()
    );
    for record in &plan.deleted {
        println!(
            "  {} {}  {}",
            "-".red(),
            util::short_id(&record.id).dimmed(),
            util::format_absolute_time(record.ts_unix_ms)
        );
    }

    Ok(())
}
