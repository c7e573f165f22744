//! Timestamped tar.gz archives

use crate::run_tool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::debug;
use vigil_core::{destination_for, BackupOptions, BackupRunner};

/// Writes `<destination_root>/<name>/<name>-<stamp>.tar.gz` on every run.
/// Unlike the rsync mirror, each run leaves an independent archive, which
/// is what gives the retention tiers something to prune.
#[derive(Default)]
pub struct ArchiveRunner;

impl ArchiveRunner {
    pub fn new() -> Self {
        Self
    }
}

fn archive_args(source: &Path, archive: &Path, options: &BackupOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-czf".into(), archive.into()];

    for pattern in options.exclude_dirs.iter().chain(&options.exclude_files) {
        args.push(format!("--exclude={}", pattern).into());
    }
    for extra in &options.extra_args {
        args.push(extra.into());
    }

    // Archive the directory by its own name from its parent
    match (source.parent(), source.file_name()) {
        (Some(parent), Some(dir_name)) => {
            args.push("-C".into());
            args.push(parent.into());
            args.push(dir_name.into());
        }
        _ => {
            args.push("-C".into());
            args.push(source.into());
            args.push(".".into());
        }
    }
    args
}

#[async_trait]
impl BackupRunner for ArchiveRunner {
    async fn run_backup(&self, source: &Path, name: &str, options: &BackupOptions) -> Result<()> {
        let destination = destination_for(&options.destination_root, name);
        tokio::fs::create_dir_all(&destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let archive = destination.join(format!("{}-{}.tar.gz", name, stamp));

        debug!("Archiving {} to {}", source.display(), archive.display());

        let mut cmd = Command::new("tar");
        cmd.args(archive_args(source, &archive, options));
        run_tool("tar", cmd).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_archive_from_parent() {
        let options = BackupOptions::new("/backups");
        let args = archive_args(
            Path::new("/home/user/docs"),
            Path::new("/backups/docs/docs-20240301-080000.tar.gz"),
            &options,
        );

        let expected: Vec<OsString> = vec![
            "-czf".into(),
            "/backups/docs/docs-20240301-080000.tar.gz".into(),
            "-C".into(),
            "/home/user".into(),
            "docs".into(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_args_carry_exclude_patterns() {
        let mut options = BackupOptions::new("/backups");
        options.exclude_dirs = vec!["target".to_string()];

        let args = archive_args(
            Path::new("/src"),
            Path::new("/backups/src/src-1.tar.gz"),
            &options,
        );

        assert!(args.contains(&OsString::from("--exclude=target")));
    }
}
