//! Event filtering: hidden files, editor temp files, excluded names

use crate::event::ChangeEvent;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};

/// Decides which change events are worth a backup.
///
/// Rules are applied in order, first match wins:
/// 1. Any path component below the watch root that is hidden (leading `.`)
///    or an editor temp name (leading or trailing `~`) rejects the event.
/// 2. The base filename is matched against the excluded file patterns.
/// 3. Every directory component, and the path's own name when the event is
///    for a directory, is matched against the excluded directory patterns.
pub struct EventFilter {
    root: PathBuf,
    exclude_dirs: GlobSet,
    exclude_files: GlobSet,
}

impl EventFilter {
    pub fn new(
        root: impl Into<PathBuf>,
        exclude_dirs: &[String],
        exclude_files: &[String],
    ) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            exclude_dirs: build_glob_set(exclude_dirs)?,
            exclude_files: build_glob_set(exclude_files)?,
        })
    }

    /// True if the event should be dropped without scheduling a trigger.
    pub fn should_skip(&self, event: &ChangeEvent) -> bool {
        let rel = event.path.strip_prefix(&self.root).unwrap_or(&event.path);

        let components: Vec<&str> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();

        for name in &components {
            if is_hidden_or_temp(name) {
                return true;
            }
        }

        if let Some(file_name) = components.last() {
            if self.exclude_files.is_match(Path::new(file_name)) {
                return true;
            }
        }

        let dir_count = if event.is_dir {
            components.len()
        } else {
            components.len().saturating_sub(1)
        };
        for name in &components[..dir_count] {
            if self.exclude_dirs.is_match(Path::new(name)) {
                return true;
            }
        }

        false
    }
}

fn is_hidden_or_temp(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('~') || name.ends_with('~')
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("Invalid exclude pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to compile exclude patterns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeKind;

    fn filter(dirs: &[&str], files: &[&str]) -> EventFilter {
        let dirs: Vec<String> = dirs.iter().map(|s| s.to_string()).collect();
        let files: Vec<String> = files.iter().map(|s| s.to_string()).collect();
        EventFilter::new("/watch", &dirs, &files).unwrap()
    }

    fn file_event(path: &str) -> ChangeEvent {
        ChangeEvent::new(path, ChangeKind::Modified)
    }

    fn dir_event(path: &str) -> ChangeEvent {
        ChangeEvent {
            path: path.into(),
            kind: ChangeKind::Created,
            is_dir: true,
        }
    }

    #[test]
    fn test_plain_file_passes() {
        let f = filter(&[], &[]);
        assert!(!f.should_skip(&file_event("/watch/src/main.rs")));
    }

    #[test]
    fn test_git_internals_filtered_without_any_config() {
        let f = filter(&[], &[]);
        assert!(f.should_skip(&file_event("/watch/.git/index")));
        assert!(f.should_skip(&file_event("/watch/.git/objects/ab/cd")));
    }

    #[test]
    fn test_hidden_and_temp_names_filtered() {
        let f = filter(&[], &[]);
        assert!(f.should_skip(&file_event("/watch/.env")));
        assert!(f.should_skip(&file_event("/watch/notes.txt~")));
        assert!(f.should_skip(&file_event("/watch/~$report.docx")));
        assert!(f.should_skip(&file_event("/watch/src/.cache/data.bin")));
    }

    #[test]
    fn test_exclude_files_matches_base_name() {
        let f = filter(&[], &["*.log", "*.tmp"]);
        assert!(f.should_skip(&file_event("/watch/app.log")));
        assert!(f.should_skip(&file_event("/watch/logs/app.log")));
        assert!(f.should_skip(&file_event("/watch/scratch.tmp")));
        assert!(!f.should_skip(&file_event("/watch/app.rs")));
    }

    #[test]
    fn test_exclude_dirs_matches_any_directory_component() {
        let f = filter(&["node_modules", "target"], &[]);
        assert!(f.should_skip(&file_event("/watch/node_modules/pkg/index.js")));
        assert!(f.should_skip(&file_event("/watch/app/target/debug/bin")));
        assert!(!f.should_skip(&file_event("/watch/src/targets.rs")));
    }

    #[test]
    fn test_exclude_dirs_checks_own_name_only_for_directories() {
        let f = filter(&["node_modules"], &[]);
        assert!(f.should_skip(&dir_event("/watch/node_modules")));
        // A file that happens to carry an excluded directory name passes
        assert!(!f.should_skip(&file_event("/watch/node_modules")));
    }

    #[test]
    fn test_exclude_dirs_supports_globs() {
        let f = filter(&["build*"], &[]);
        assert!(f.should_skip(&file_event("/watch/build-cache/out.o")));
        assert!(!f.should_skip(&file_event("/watch/src/out.o")));
    }

    #[test]
    fn test_path_outside_root_still_checked() {
        let f = filter(&[], &["*.log"]);
        assert!(f.should_skip(&file_event("elsewhere/app.log")));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = EventFilter::new("/watch", &["a{".to_string()], &[]);
        assert!(result.is_err());
    }
}
