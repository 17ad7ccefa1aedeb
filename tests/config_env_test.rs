//! Environment overrides for settings
//!
//! Kept in its own test binary: it mutates the process environment.

use std::fs;

use tempfile::TempDir;

use fstree::config::{local_config_path, Settings};

#[test]
fn given_env_vars_when_loading_then_they_override_local_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        local_config_path(temp.path()),
        "default_root = \"R\"\nshow_tree = true\n",
    )
    .unwrap();
    std::env::set_var("FSTREE_DEFAULT_ROOT", "env-root");
    std::env::set_var("FSTREE_SHOW_TREE", "false");

    let settings = Settings::load(Some(temp.path()));

    std::env::remove_var("FSTREE_DEFAULT_ROOT");
    std::env::remove_var("FSTREE_SHOW_TREE");
    let settings = settings.unwrap();
    assert_eq!(settings.default_root, "env-root");
    assert!(!settings.show_tree);
    assert!(settings.stop_on_error);
}
