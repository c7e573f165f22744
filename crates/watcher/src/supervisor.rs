//! Lifecycle wrappers around a watch session

use crate::session::WatchSession;
use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::info;

fn flatten(result: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(anyhow!("Watch task failed: {}", e)),
    }
}

/// Watch for a fixed duration, then stop.
///
/// The session is always stopped on the way out, including when it ends
/// early on its own; a notifier error surfaces as the returned error.
pub async fn run_for(session: Arc<WatchSession>, duration: Duration) -> Result<()> {
    let mut handle = tokio::spawn(session.clone().start());

    let early = tokio::select! {
        _ = tokio::time::sleep(duration) => None,
        result = &mut handle => Some(result),
    };

    session.stop();

    match early {
        Some(result) => flatten(result),
        None => {
            info!("Watch window for '{}' elapsed, stopping", session.name());
            flatten(handle.await)
        }
    }
}

/// Watch until `stop_signal` completes or the session ends on its own.
///
/// Nothing is left running when this returns: the session is stopped and
/// its background tasks have finished.
pub async fn run_until_signaled(
    session: Arc<WatchSession>,
    stop_signal: impl Future<Output = ()>,
) -> Result<()> {
    let mut handle = tokio::spawn(session.clone().start());

    let early = tokio::select! {
        _ = stop_signal => None,
        result = &mut handle => Some(result),
    };

    session.stop();

    match early {
        Some(result) => flatten(result),
        None => {
            info!("Stop signal received, stopping watch for '{}'", session.name());
            flatten(handle.await)
        }
    }
}
