//! Integration tests for ConfigManager and harness settings handling
//!
//! These tests verify:
//! - Settings loading and saving
//! - Default fallback when the settings file is absent
//! - Partial files filling in defaults
//! - Duration accessors derived from raw integer fields

use camino::Utf8PathBuf;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use uiharness::models::HarnessSettings;
use uiharness::ConfigManager;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), &config_path);
}

#[test]
fn test_load_default_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    // Settings file doesn't exist, should return defaults
    let settings = manager.load_settings().unwrap();

    assert_eq!(settings.startup_timeout(), Duration::from_secs(30));
    assert_eq!(settings.poll_interval(), Duration::from_millis(200));
    assert_eq!(settings.output_timeout(), Duration::from_secs(20));
    assert_eq!(settings.grace_period(), Duration::from_secs(10));
    assert_eq!(settings.force_period(), Duration::from_secs(3));
    assert_eq!(settings.harness.output_postfix, "_superSigned");
}

#[test]
fn test_save_and_load_settings() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut settings = manager.load_settings().unwrap();
    settings.harness.startup_timeout_secs = 60;
    settings.harness.poll_interval_ms = 50;
    settings.harness.output_postfix = "_signed".to_string();

    manager.save_settings(&settings).unwrap();
    let loaded = manager.load_settings().unwrap();

    assert_eq!(loaded, settings);
    assert_eq!(loaded.startup_timeout(), Duration::from_secs(60));
    assert_eq!(loaded.poll_interval(), Duration::from_millis(50));
}

#[test]
fn test_partial_settings_file_fills_defaults() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        config_path.join("Harness Settings.yaml"),
        "Harness:\n  \"Force Period\": 7\n",
    )
    .unwrap();

    let settings = manager.load_settings().unwrap();

    assert_eq!(settings.force_period(), Duration::from_secs(7));
    // Everything else keeps its default
    assert_eq!(settings.grace_period(), Duration::from_secs(10));
    assert_eq!(settings.harness.output_postfix, "_superSigned");
}

#[test]
fn test_malformed_settings_file_is_an_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        config_path.join("Harness Settings.yaml"),
        "Harness:\n  \"Grace Period\": \"not a number\"\n",
    )
    .unwrap();

    assert!(manager.load_settings().is_err());
}

#[test]
fn test_settings_equal_defaults_round_trip() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    manager.save_settings(&HarnessSettings::default()).unwrap();

    assert_eq!(manager.load_settings().unwrap(), HarnessSettings::default());
}
