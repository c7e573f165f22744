//! Backup record storage and retention
//!
//! This crate provides:
//! - Backup record data structures (ULID-based IDs)
//! - The `RecordStore` capability consumed by the retention engine
//! - A sled-backed durable record database
//! - The tiered daily/weekly/monthly retention engine

pub mod db;
pub mod record;
pub mod retention;
pub mod store;

// Re-exports
pub use db::RecordDb;
pub use record::BackupRecord;
pub use retention::{cleanup_for_name, partition, RetentionPlan, RetentionPolicy, SweepStats};
pub use store::{MemoryStore, RecordStore};

/// Result type for store operations
pub type Result<T> = anyhow::Result<T>;
