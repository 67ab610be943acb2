//! Tests for configuration loading and data folder resolution

use serial_test::serial;
use solace_common::config::{self, TomlConfig};
use std::path::PathBuf;

#[test]
#[serial]
fn test_cli_argument_has_highest_priority() {
    std::env::set_var("SOLACE_DATA_DIR", "/tmp/from-env");

    let folder = config::resolve_data_folder(Some("/tmp/from-cli"), "SOLACE_DATA_DIR");
    assert_eq!(folder, PathBuf::from("/tmp/from-cli"));

    std::env::remove_var("SOLACE_DATA_DIR");
}

#[test]
#[serial]
fn test_env_variable_used_when_no_cli_arg() {
    std::env::set_var("SOLACE_DATA_DIR", "/tmp/from-env");

    let folder = config::resolve_data_folder(None, "SOLACE_DATA_DIR");
    assert_eq!(folder, PathBuf::from("/tmp/from-env"));

    std::env::remove_var("SOLACE_DATA_DIR");
}

#[test]
#[serial]
fn test_blank_env_variable_is_ignored() {
    std::env::set_var("SOLACE_DATA_DIR", "   ");

    let folder = config::resolve_data_folder(None, "SOLACE_DATA_DIR");
    assert_ne!(folder, PathBuf::from("   "));

    std::env::remove_var("SOLACE_DATA_DIR");
}

#[test]
fn test_write_and_reparse_toml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = TomlConfig {
        data_folder: Some("/srv/solace".to_string()),
        tracking_api_key: Some("key-123".to_string()),
        tracking_webhook_secret: Some("hush".to_string()),
    };

    config::write_toml_config(&cfg, &path).expect("Should write config (creating parent dirs)");
    assert!(path.exists());

    let text = std::fs::read_to_string(&path).unwrap();
    let parsed: TomlConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.data_folder.as_deref(), Some("/srv/solace"));
    assert_eq!(parsed.tracking_api_key.as_deref(), Some("key-123"));
    assert_eq!(parsed.tracking_webhook_secret.as_deref(), Some("hush"));
}

#[test]
fn test_prepare_data_folder_creates_directory_and_db_path() {
    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("solace-data");

    let db_path = config::prepare_data_folder(&folder).expect("Should create data folder");
    assert!(folder.is_dir());
    assert!(db_path.ends_with(config::DATABASE_FILE));
}
