//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/prepinfo/prepinfo.toml`
//! 3. Local config: `.prepinfo.toml` in the directory of the input document
//! 4. Environment variables: `PREPINFO_*` prefix
//! 5. Command line flags (applied by the CLI layer)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::line::DEFAULT_PLACEHOLDER;

/// Local config file name, looked up next to the input document.
pub const LOCAL_CONFIG_FILE: &str = ".prepinfo.toml";

/// Unified configuration for prepinfo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Copy existing menu blocks unchanged instead of regenerating them
    pub keep_menus: bool,
    /// Line prefix marking a heading that has no node of its own
    pub placeholder_marker: String,
    /// Report nodes below Top that no menu lists
    pub report_missing_entries: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keep_menus: false,
            placeholder_marker: DEFAULT_PLACEHOLDER.to_string(),
            report_missing_entries: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub keep_menus: Option<bool>,
    pub placeholder_marker: Option<String>,
    pub report_missing_entries: Option<bool>,
}

/// Get the XDG config directory for prepinfo.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "prepinfo").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("prepinfo.toml"))
}

/// Get the path to the local config file for documents in `doc_dir`.
pub fn local_config_path(doc_dir: &Path) -> PathBuf {
    doc_dir.join(LOCAL_CONFIG_FILE)
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

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            keep_menus: overlay.keep_menus.unwrap_or(self.keep_menus),
            placeholder_marker: overlay
                .placeholder_marker
                .clone()
                .unwrap_or_else(|| self.placeholder_marker.clone()),
            report_missing_entries: overlay
                .report_missing_entries
                .unwrap_or(self.report_missing_entries),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `doc_dir` - Directory of the input document, for the local config
    pub fn load(doc_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = doc_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Load only the local config on top of defaults (no global file, no env vars).
    pub fn load_local_only(doc_dir: &Path) -> Result<Self, ApplicationError> {
        let local_path = local_config_path(doc_dir);
        if !local_path.exists() {
            return Ok(Self::default());
        }
        Ok(Self::default().merge_with(&load_raw_settings(&local_path)?))
    }

    /// Apply PREPINFO_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PREPINFO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_bool("keep_menus") {
            settings.keep_menus = val;
        }
        if let Ok(val) = config.get_string("placeholder_marker") {
            settings.placeholder_marker = val;
        }
        if let Ok(val) = config.get_bool("report_missing_entries") {
            settings.report_missing_entries = val;
        }
        Ok(settings)
    }

    /// Render as TOML, e.g. for `prepinfo config`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}
