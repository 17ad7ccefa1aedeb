//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/fstree/fstree.toml`
//! 3. Local config: `<dir>/.fstree.toml` (directory of the script being replayed)
//! 4. Environment variables: `FSTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Unified configuration for fstree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Root identity for scripts without a `root` directive (default: "/")
    pub default_root: String,
    /// Stop replaying at the first rejected step (default: true)
    pub stop_on_error: bool,
    /// Check every tree invariant after each replayed step (default: false)
    pub verify_invariants: bool,
    /// Print the final tree after `run` (default: true)
    pub show_tree: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_root: "/".into(),
            stop_on_error: true,
            verify_invariants: false,
            show_tree: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub default_root: Option<String>,
    pub stop_on_error: Option<bool>,
    pub verify_invariants: Option<bool>,
    pub show_tree: Option<bool>,
}

/// Get the XDG config directory for fstree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fstree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("fstree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".fstree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            default_root: overlay
                .default_root
                .clone()
                .unwrap_or_else(|| self.default_root.clone()),
            stop_on_error: overlay.stop_on_error.unwrap_or(self.stop_on_error),
            verify_invariants: overlay.verify_invariants.unwrap_or(self.verify_invariants),
            show_tree: overlay.show_tree.unwrap_or(self.show_tree),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.fstree.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/fstree/fstree.toml`
    /// 3. Local config: `<local_dir>/.fstree.toml`
    /// 4. Environment variables: `FSTREE_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply FSTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("FSTREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("default_root") {
            settings.default_root = val;
        }
        if let Ok(val) = config.get_bool("stop_on_error") {
            settings.stop_on_error = val;
        }
        if let Ok(val) = config.get_bool("verify_invariants") {
            settings.verify_invariants = val;
        }
        if let Ok(val) = config.get_bool("show_tree") {
            settings.show_tree = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# fstree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/fstree/fstree.toml
#   Local:  <script_dir>/.fstree.toml
#   Env:    FSTREE_* environment variables (e.g. FSTREE_DEFAULT_ROOT=/)

# Root used when a script has no `root` directive
# default_root = "/"

# Stop replaying at the first rejected mutation
# stop_on_error = true

# Check every tree invariant after each replayed mutation (slow)
# verify_invariants = false

# Print the final tree after `fstree run`
# show_tree = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
