//! Backup runners delegating to external tools
//!
//! The actual byte copying is rsync's or tar's job; these runners only
//! build argument lists, spawn the tool off the async runtime, and turn a
//! non-zero exit into an error carrying the tool's stderr.

pub mod archive;
pub mod rsync;

pub use archive::ArchiveRunner;
pub use rsync::RsyncRunner;

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;

/// Errors from an external backup tool.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: &'static str,
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run an external tool to completion on the blocking pool.
pub(crate) async fn run_tool(tool: &'static str, mut cmd: Command) -> Result<Output> {
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .with_context(|| format!("{} task was cancelled", tool))?
        .map_err(|source| SyncError::Launch { tool, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(SyncError::Failed {
            tool,
            status: output.status,
            stderr,
        }
        .into());
    }

    Ok(output)
}
