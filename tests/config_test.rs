//! Tests for layered settings loading

use std::fs;

use tempfile::TempDir;

use fstree::application::ApplicationError;
use fstree::config::{local_config_path, Settings};

#[test]
fn given_no_local_config_when_loading_then_defaults_apply() {
    let temp = TempDir::new().unwrap();

    let settings = Settings::load(Some(temp.path())).unwrap();

    assert_eq!(settings.default_root, "/");
    assert!(settings.stop_on_error);
    assert!(!settings.verify_invariants);
}

#[test]
fn given_local_config_when_loading_then_overrides_given_fields() {
    let temp = TempDir::new().unwrap();
    fs::write(
        local_config_path(temp.path()),
        "default_root = \"R\"\nverify_invariants = true\n",
    )
    .unwrap();

    let settings = Settings::load(Some(temp.path())).unwrap();

    assert_eq!(settings.default_root, "R");
    assert!(settings.verify_invariants);
    assert!(settings.stop_on_error);
}

#[test]
fn given_malformed_local_config_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    fs::write(local_config_path(temp.path()), "stop_on_error = \"sometimes\"\n").unwrap();

    let err = Settings::load(Some(temp.path())).unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(err.to_string().contains(".fstree.toml"));
}

#[test]
fn given_loaded_settings_when_shown_then_output_reloads_identically() {
    let temp = TempDir::new().unwrap();
    fs::write(local_config_path(temp.path()), "show_tree = false\n").unwrap();
    let settings = Settings::load(Some(temp.path())).unwrap();

    let other = TempDir::new().unwrap();
    fs::write(local_config_path(other.path()), settings.to_toml().unwrap()).unwrap();

    assert_eq!(Settings::load(Some(other.path())).unwrap(), settings);
}
