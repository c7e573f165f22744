//! Notifier backends that produce raw change events

use crate::event::ChangeEvent;
use async_trait::async_trait;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Errors from the watch backend.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create watcher: {0}")]
    Creation(#[from] notify::Error),

    #[error("Failed to watch path {path}: {source}")]
    WatchPath {
        path: PathBuf,
        source: notify::Error,
    },
}

/// Keeps a watch alive; dropping it releases the backend.
pub trait WatchHandle: Send {}

/// Source of raw change events for one directory tree.
///
/// Events flow into the provided channel until the handle is dropped.
/// Closing the channel from the backend side means the backend died.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn start_watch(
        &self,
        path: &Path,
        recursive: bool,
        events: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Box<dyn WatchHandle>, WatchError>;
}

/// OS-native notifier backed by the platform watcher (inotify, FSEvents,
/// ReadDirectoryChangesW).
pub struct NotifyWatcher;

struct NotifyHandle {
    _watcher: RecommendedWatcher,
}

impl WatchHandle for NotifyHandle {}

#[async_trait]
impl ChangeNotifier for NotifyWatcher {
    async fn start_watch(
        &self,
        path: &Path,
        recursive: bool,
        events: mpsc::UnboundedSender<ChangeEvent>,
    ) -> Result<Box<dyn WatchHandle>, WatchError> {
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for path in &event.paths {
                        let change = ChangeEvent {
                            path: path.clone(),
                            kind: event.kind.into(),
                            is_dir: path.is_dir(),
                        };
                        // Receiver gone means the session ended
                        if events.send(change).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => warn!("Watch backend error: {}", e),
            },
            Config::default(),
        )?;

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(path, mode)
            .map_err(|e| WatchError::WatchPath {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Box::new(NotifyHandle { _watcher: watcher }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_native_watch_reports_writes() {
        let temp = TempDir::new().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _handle = NotifyWatcher
            .start_watch(temp.path(), true, tx)
            .await
            .unwrap();

        // Give the backend a moment to register the watch
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(temp.path().join("file.txt"), b"data").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(event.path.ends_with("file.txt"));
    }

    #[tokio::test]
    async fn test_watching_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = NotifyWatcher.start_watch(&missing, true, tx).await;
        assert!(result.is_err());
    }
}
