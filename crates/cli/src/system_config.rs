//! System configuration
//!
//! One TOML file at `<config dir>/vigil/config.toml` drives every command:
//! watch timings and exclusions, where backups go and with which tool, and
//! the retention keep-counts. Missing file means defaults; missing keys fall
//! back per section. `VIGIL_CONFIG_DIR` overrides the platform config
//! directory, which the integration tests rely on.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use vigil_core::BackupOptions;
use vigil_store::RetentionPolicy;

/// Everything vigil reads from disk at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    pub watch: WatchSection,
    pub backup: BackupSection,
    pub retention: RetentionSection,
}

/// `[watch]` section: debounce/throttle timings and event exclusions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    /// Quiet period after the last change before a backup starts (seconds)
    pub wait_after_changes_secs: u64,
    /// Minimum interval between completed backups (seconds)
    pub min_backup_interval_secs: u64,
    /// Directory name patterns that never trigger a backup
    pub exclude_dirs: Vec<String>,
    /// File name patterns that never trigger a backup
    pub exclude_files: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            wait_after_changes_secs: 5,
            min_backup_interval_secs: 10,
            exclude_dirs: vec!["node_modules".to_string(), "target".to_string()],
            exclude_files: vec!["*.tmp".to_string(), "*.swp".to_string()],
        }
    }
}

/// `[backup]` section: destination layout and the external tool to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupSection {
    /// Root directory that per-name destinations live under
    pub destination: PathBuf,
    /// Which external tool performs a run
    pub mode: BackupMode,
    /// Extra arguments passed through to rsync in sync mode
    pub rsync_extra_args: Vec<String>,
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            mode: BackupMode::Sync,
            rsync_extra_args: Vec::new(),
        }
    }
}

/// `[retention]` section: keep-counts for the three tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionSection {
    pub keep_daily: u32,
    pub keep_weekly: u32,
    pub keep_monthly: u32,
}

impl Default for RetentionSection {
    fn default() -> Self {
        let policy = RetentionPolicy::default();
        Self {
            keep_daily: policy.keep_daily,
            keep_weekly: policy.keep_weekly,
            keep_monthly: policy.keep_monthly,
        }
    }
}

impl RetentionSection {
    /// The policy value handed to the retention engine.
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep_daily: self.keep_daily,
            keep_weekly: self.keep_weekly,
            keep_monthly: self.keep_monthly,
        }
    }
}

/// How one backup run is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// rsync mirror: one up-to-date copy per name
    Sync,
    /// tar.gz archive: one timestamped file per run
    Archive,
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupMode::Sync => write!(f, "sync"),
            BackupMode::Archive => write!(f, "archive"),
        }
    }
}

impl FromStr for BackupMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sync" => Ok(BackupMode::Sync),
            "archive" => Ok(BackupMode::Archive),
            other => anyhow::bail!("Unknown backup mode '{}': expected 'sync' or 'archive'", other),
        }
    }
}

impl SystemConfig {
    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<()> {
        let watch = &self.watch;
        if !(1..=3600).contains(&watch.wait_after_changes_secs) {
            anyhow::bail!(
                "watch.wait_after_changes_secs must be 1-3600 (got {})",
                watch.wait_after_changes_secs
            );
        }
        if !(1..=86400).contains(&watch.min_backup_interval_secs) {
            anyhow::bail!(
                "watch.min_backup_interval_secs must be 1-86400 (got {})",
                watch.min_backup_interval_secs
            );
        }

        if self.backup.destination.as_os_str().is_empty() {
            anyhow::bail!("backup.destination must not be empty");
        }

        let retention = &self.retention;
        for (key, value) in [
            ("retention.keep_daily", retention.keep_daily),
            ("retention.keep_weekly", retention.keep_weekly),
            ("retention.keep_monthly", retention.keep_monthly),
        ] {
            if value > 10_000 {
                anyhow::bail!("{} must be 0-10,000 (got {})", key, value);
            }
        }

        Ok(())
    }

    /// Options handed to the backup runner on every attempt.
    pub fn backup_options(&self) -> BackupOptions {
        BackupOptions {
            destination_root: self.backup.destination.clone(),
            exclude_dirs: self.watch.exclude_dirs.clone(),
            exclude_files: self.watch.exclude_files.clone(),
            extra_args: match self.backup.mode {
                BackupMode::Sync => self.backup.rsync_extra_args.clone(),
                BackupMode::Archive => Vec::new(),
            },
        }
    }

    pub fn wait_after_changes(&self) -> Duration {
        Duration::from_secs(self.watch.wait_after_changes_secs)
    }

    pub fn min_backup_interval(&self) -> Duration {
        Duration::from_secs(self.watch.min_backup_interval_secs)
    }
}

fn default_destination() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Backups").join("vigil"))
        .unwrap_or_else(|| PathBuf::from("vigil-backups"))
}

/// Path of the config file, honoring the `VIGIL_CONFIG_DIR` override.
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("VIGIL_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("config.toml"));
    }
    dirs::config_dir().map(|dir| dir.join("vigil").join("config.toml"))
}

/// Load the system configuration, defaulting when no file exists.
pub fn load() -> Result<SystemConfig> {
    let path = config_file_path().context("Could not determine config file path")?;
    load_from(&path)
}

/// Save the configuration to its standard location.
pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

/// Create the config file with defaults if it does not exist yet.
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        save_to(&SystemConfig::default(), &path)?;
    }
    Ok(path)
}

pub(crate) fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    Ok(config)
}

pub(crate) fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    config.validate().context("Refusing to save invalid configuration")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    let text = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    Ok(())
}

/// A fully commented example configuration.
pub fn example_config() -> String {
    r#"# Vigil configuration
# Default location: ~/.config/vigil/config.toml

[watch]
# Quiet period after the last change before a backup starts (seconds, 1-3600).
wait_after_changes_secs = 5
# Minimum interval between completed backups (seconds, 1-86400).
min_backup_interval_secs = 10
# Directory names that never trigger a backup (glob patterns).
exclude_dirs = ["node_modules", "target"]
# File names that never trigger a backup (glob patterns).
exclude_files = ["*.tmp", "*.swp"]

[backup]
# Root directory; each backup name gets a subdirectory of its own.
destination = "/home/user/Backups/vigil"
# "sync" mirrors with rsync; "archive" writes timestamped tar.gz files.
mode = "sync"
# Extra arguments passed to rsync in sync mode.
rsync_extra_args = []

[retention]
# Keep-counts per tier; 0 means the tier keeps nothing (0-10000).
keep_daily = 7
keep_weekly = 4
keep_monthly = 6
"#
    .to_string()
}
