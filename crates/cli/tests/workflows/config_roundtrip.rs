//! Config workflow
//!
//! The only test that touches `VIGIL_CONFIG_DIR`; the other workflows
//! pass explicit paths, so setting it here cannot race them.

use tempfile::TempDir;
use vigil_cli::system_config;

#[test]
fn test_config_dir_override_round_trip() {
    let temp = TempDir::new().unwrap();
    std::env::set_var("VIGIL_CONFIG_DIR", temp.path());

    let path = system_config::config_file_path().unwrap();
    assert_eq!(path, temp.path().join("config.toml"));

    // First init writes defaults, a second leaves the file alone
    let created = system_config::init_if_missing().unwrap();
    assert!(created.exists());
    let mut config = system_config::load().unwrap();
    assert_eq!(config, system_config::SystemConfig::default());

    config.retention.keep_daily = 3;
    config.watch.wait_after_changes_secs = 30;
    system_config::save(&config).unwrap();
    system_config::init_if_missing().unwrap();

    let back = system_config::load().unwrap();
    assert_eq!(back.retention.keep_daily, 3);
    assert_eq!(back.watch.wait_after_changes_secs, 30);

    std::env::remove_var("VIGIL_CONFIG_DIR");
}
