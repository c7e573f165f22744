//! Configuration management command
//!
//! Provides CLI interface to view and edit system configuration.

use crate::system_config::{self, BackupMode};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;

/// List all configuration values
pub async fn run_list() -> Result<()> {
    let config = system_config::load()?;
    let config_path =
        system_config::config_file_path().context("Could not determine config file path")?;

    println!("{}", "System Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), config_path.display().dimmed());

    println!("{}", "[watch]".yellow());
    println!(
        "  {} = {} {}",
        "wait_after_changes_secs".cyan(),
        config.watch.wait_after_changes_secs,
        format!("({}s quiet period)", config.watch.wait_after_changes_secs).dimmed()
    );
    println!(
        "  {} = {} {}",
        "min_backup_interval_secs".cyan(),
        config.watch.min_backup_interval_secs,
        format!("({}s between runs)", config.watch.min_backup_interval_secs).dimmed()
    );
    println!(
        "  {} = [{}]",
        "exclude_dirs".cyan(),
        config.watch.exclude_dirs.join(", ")
    );
    println!(
        "  {} = [{}]",
        "exclude_files".cyan(),
        config.watch.exclude_files.join(", ")
    );

    println!("\n{}", "[backup]".yellow());
    println!(
        "  {} = {}",
        "destination".cyan(),
        config.backup.destination.display()
    );
    println!("  {} = {}", "mode".cyan(), config.backup.mode);
    println!(
        "  {} = [{}]",
        "rsync_extra_args".cyan(),
        config.backup.rsync_extra_args.join(", ")
    );

    println!("\n{}", "[retention]".yellow());
    println!("  {} = {}", "keep_daily".cyan(), config.retention.keep_daily);
    println!("  {} = {}", "keep_weekly".cyan(), config.retention.keep_weekly);
    println!(
        "  {} = {}",
        "keep_monthly".cyan(),
        config.retention.keep_monthly
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!("  wait_after_changes_secs: 1-3600");
    println!("  min_backup_interval_secs: 1-86400");
    println!("  keep_daily / keep_weekly / keep_monthly: 0-10,000 (0 = tier keeps nothing)");
    println!("  mode: sync | archive");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(key: &str) -> Result<()> {
    let config = system_config::load()?;

    let value = match key {
        "watch.wait_after_changes_secs" => config.watch.wait_after_changes_secs.to_string(),
        "watch.min_backup_interval_secs" => config.watch.min_backup_interval_secs.to_string(),
        "watch.exclude_dirs" => config.watch.exclude_dirs.join(","),
        "watch.exclude_files" => config.watch.exclude_files.join(","),
        "backup.destination" => config.backup.destination.display().to_string(),
        "backup.mode" => config.backup.mode.to_string(),
        "backup.rsync_extra_args" => config.backup.rsync_extra_args.join(","),
        "retention.keep_daily" => config.retention.keep_daily.to_string(),
        "retention.keep_weekly" => config.retention.keep_weekly.to_string(),
        "retention.keep_monthly" => config.retention.keep_monthly.to_string(),
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'vigil config --list' to see available keys.",
            key
        ),
    };

    println!("{}", value);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(key: &str, value: &str) -> Result<()> {
    let mut config = system_config::load()?;

    match key {
        "watch.wait_after_changes_secs" => {
            let val: u64 = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
            config.watch.wait_after_changes_secs = val;
        }
        "watch.min_backup_interval_secs" => {
            let val: u64 = value
                .parse()
                .context("Invalid value: must be a positive integer")?;
            config.watch.min_backup_interval_secs = val;
        }
        "watch.exclude_dirs" => {
            config.watch.exclude_dirs = parse_list(value);
        }
        "watch.exclude_files" => {
            config.watch.exclude_files = parse_list(value);
        }
        "backup.destination" => {
            config.backup.destination = PathBuf::from(value);
        }
        "backup.mode" => {
            let val: BackupMode = value.parse()?;
            config.backup.mode = val;
        }
        "backup.rsync_extra_args" => {
            config.backup.rsync_extra_args = parse_list(value);
        }
        "retention.keep_daily" => {
            let val: u32 = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
            config.retention.keep_daily = val;
        }
        "retention.keep_weekly" => {
            let val: u32 = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
            config.retention.keep_weekly = val;
        }
        "retention.keep_monthly" => {
            let val: u32 = value
                .parse()
                .context("Invalid value: must be a non-negative integer")?;
            config.retention.keep_monthly = val;
        }
        _ => anyhow::bail!(
            "Unknown config key: {}. Use 'vigil config --list' to see available keys.",
            key
        ),
    }

    // Validate before saving
    config.validate().context("Invalid configuration value")?;

    system_config::save(&config)?;

    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    println!(
        "{}",
        "Note: A running watch keeps its old settings until restarted".yellow()
    );

    Ok(())
}

/// Show the config file path and optionally create it
pub async fn run_path(create: bool) -> Result<()> {
    let config_path =
        system_config::config_file_path().context("Could not determine config file path")?;

    if create && !config_path.exists() {
        system_config::init_if_missing()?;
        println!(
            "{} Created config file at: {}",
            "✓".green(),
            config_path.display()
        );
    } else if config_path.exists() {
        println!("{}", config_path.display());
    } else {
        println!("{}", config_path.display());
        println!("{}", "File does not exist. Use --create to create it.".yellow());
    }

    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    let example = system_config::example_config();
    println!("{}", example);
    Ok(())
}

/// Comma-separated list values ("node_modules,target").
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
