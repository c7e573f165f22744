//! Shared vocabulary for Vigil
//!
//! This crate provides:
//! - The `BackupRunner` capability trait consumed by the watcher
//! - Backup naming and destination layout helpers
//! - Timestamp helpers shared by the store and CLI

pub mod naming;
pub mod runner;
pub mod time;

// Re-exports
pub use naming::{backup_name_for, destination_for};
pub use runner::{BackupOptions, BackupRunner};
pub use time::now_unix_ms;

/// Result type for core operations
pub type Result<T> = anyhow::Result<T>;
