//! CLI command implementations

pub mod backup;
pub mod config;
pub mod list;
pub mod prune;
pub mod watch;
