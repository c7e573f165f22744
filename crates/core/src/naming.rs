//! Logical backup names and destination layout
//!
//! A logical name groups every backup of one source directory. Names default
//! to the directory's base name, sanitized so they are safe as path segments
//! and as record keys.

use std::path::{Path, PathBuf};

/// Derive the logical backup name for a source directory.
///
/// Uses the directory's base name, lowercased, with anything outside
/// `[a-z0-9._-]` replaced by `-`. Falls back to `"backup"` for paths with no
/// usable base name (e.g. `/`).
pub fn backup_name_for(source: &Path) -> String {
    let base = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let sanitized: String = base
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "backup".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Destination directory for a logical name under the configured root.
///
/// Sync-style backups mirror the source into this directory; archive-style
/// backups drop timestamped archives next to each other inside it.
pub fn destination_for(destination_root: &Path, name: &str) -> PathBuf {
    destination_root.join(name)
}
