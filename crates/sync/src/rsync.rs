//! Mirror backups via rsync

use crate::run_tool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::debug;
use vigil_core::{destination_for, BackupOptions, BackupRunner};

/// Mirrors the source tree into `<destination_root>/<name>` with
/// `rsync -a --delete`, so each run leaves one up-to-date copy.
#[derive(Default)]
pub struct RsyncRunner;

impl RsyncRunner {
    pub fn new() -> Self {
        Self
    }
}

fn rsync_args(source: &Path, destination: &Path, options: &BackupOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-a".into(), "--delete".into()];

    for pattern in options.exclude_dirs.iter().chain(&options.exclude_files) {
        args.push("--exclude".into());
        args.push(pattern.into());
    }
    for extra in &options.extra_args {
        args.push(extra.into());
    }

    // Trailing slash: copy the directory's contents, not the directory
    args.push(format!("{}/", source.display()).into());
    args.push(destination.into());
    args
}

#[async_trait]
impl BackupRunner for RsyncRunner {
    async fn run_backup(&self, source: &Path, name: &str, options: &BackupOptions) -> Result<()> {
        let destination = destination_for(&options.destination_root, name);
        tokio::fs::create_dir_all(&destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        debug!(
            "Mirroring {} into {}",
            source.display(),
            destination.display()
        );

        let mut cmd = Command::new("rsync");
        cmd.args(rsync_args(source, &destination, options));
        run_tool("rsync", cmd).await?;

        Ok(())
    }
}
