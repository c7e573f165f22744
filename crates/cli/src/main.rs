//! Vigil CLI - vigil command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use vigil_cli::cmd;

/// Vigil - Watch directories and keep tiered backups
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backup immediately
    Backup {
        /// Source directory to back up
        path: PathBuf,

        /// Logical backup name (default: source directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Watch a directory and back up whenever it changes
    Watch {
        /// Source directory to watch
        path: PathBuf,

        /// Logical backup name (default: source directory name)
        #[arg(long)]
        name: Option<String>,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long)]
        duration: Option<u64>,

        /// Append logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Delete old backups per the retention policy
    Prune {
        /// Backup name to prune
        #[arg(long)]
        name: Option<String>,

        /// Prune every recorded backup name
        #[arg(long)]
        all: bool,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List recorded backups for a name
    List {
        /// Backup name
        name: String,

        /// Show only the most recent K records
        #[arg(long)]
        limit: Option<usize>,

        /// Output records as JSON
        #[arg(long)]
        json: bool,
    },
    /// View and edit configuration
    Config {
        /// List all configuration values
        #[arg(long)]
        list: bool,

        /// Print a single value
        #[arg(long, value_name = "KEY")]
        get: Option<String>,

        /// Set a value
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,

        /// Print the config file path
        #[arg(long)]
        path: bool,

        /// Create the config file if it does not exist (with --path)
        #[arg(long)]
        create: bool,

        /// Print a fully commented example configuration
        #[arg(long)]
        example: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Watch mode can redirect logs to a file; the guard must outlive the
    // command so buffered lines are flushed on exit.
    let _guard = init_logging(&cli.command)?;

    match cli.command {
        Commands::Backup { path, name } => cmd::backup::run(path, name).await,
        Commands::Watch {
            path,
            name,
            duration,
            ..
        } => cmd::watch::run(path, name, duration).await,
        Commands::Prune { name, all, dry_run } => cmd::prune::run(name, all, dry_run).await,
        Commands::List { name, limit, json } => cmd::list::run(name, limit, json).await,
        Commands::Config {
            list,
            get,
            set,
            path,
            create,
            example,
        } => {
            if example {
                cmd::config::run_example().await
            } else if let Some(key) = get {
                cmd::config::run_get(&key).await
            } else if let Some(pair) = set {
                cmd::config::run_set(&pair[0], &pair[1]).await
            } else if path {
                cmd::config::run_path(create).await
            } else if list {
                cmd::config::run_list().await
            } else {
                // No flag behaves like --list
                cmd::config::run_list().await
            }
        }
    }
}

fn init_logging(command: &Commands) -> Result<Option<WorkerGuard>> {
    if let Commands::Watch {
        log_file: Some(path),
        ..
    } = command
    {
        let (writer, guard) = file_writer(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(writer)
            .with_ansi(false)
            .init();
        return Ok(Some(guard));
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .init();
    Ok(None)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    Ok(tracing_appender::non_blocking(file))
}
