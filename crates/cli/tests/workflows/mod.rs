//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple components
//! and validate end-to-end behavior.

pub mod config_roundtrip;
pub mod prune_plan;
pub mod watch_pipeline;
