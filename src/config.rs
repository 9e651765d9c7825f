use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BumpError, Result};

/// File name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "mobilebump.toml";

/// Represents the complete configuration for mobile-bump.
///
/// Contains platform toggles, manifest path overrides, git automation settings and
/// presentation options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub platforms: PlatformsConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Per-platform skip toggles.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub skip_package: bool,

    #[serde(default)]
    pub skip_android: bool,

    #[serde(default)]
    pub skip_ios: bool,
}

/// Manifest path overrides, relative to the project root.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_build_gradle: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_info_plist: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_project_file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch_template() -> String {
    "release/v{version}".to_string()
}

fn default_commit_template() -> String {
    "chore: bump version to {version}\n\n{platformUpdates}".to_string()
}

fn default_tag_template() -> String {
    "v{version}".to_string()
}

/// Configuration for the git release workflow.
///
/// `auto_create_*` decide whether the step runs without asking; `skip_*` turn the
/// step off entirely.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GitConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub auto_create_branch: bool,

    #[serde(default = "default_true")]
    pub auto_create_tag: bool,

    #[serde(default)]
    pub skip_branch: bool,

    #[serde(default)]
    pub skip_tag: bool,

    #[serde(default)]
    pub skip_push: bool,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default = "default_branch_template")]
    pub branch_template: String,

    #[serde(default = "default_commit_template")]
    pub commit_template: String,

    #[serde(default = "default_tag_template")]
    pub tag_template: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            enabled: false,
            auto_create_branch: true,
            auto_create_tag: true,
            skip_branch: false,
            skip_tag: false,
            skip_push: false,
            remote: default_remote(),
            branch_template: default_branch_template(),
            commit_template: default_commit_template(),
            tag_template: default_tag_template(),
        }
    }
}

/// Presentation options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UiConfig {
    /// Show version annotations next to manifest fields in `show`.
    #[serde(default = "default_true")]
    pub code_lens: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig { code_lens: true }
    }
}

/// Resolves which configuration file applies to a project.
///
/// Order:
/// 1. Custom path provided as parameter
/// 2. `mobilebump.toml` in the project root
/// 3. `mobilebump/config.toml` in the user config directory
///
/// Returns `None` when no file exists, meaning defaults apply.
pub fn config_path(root: &Path, config_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_path {
        return Some(path.to_path_buf());
    }

    let local = root.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("mobilebump").join("config.toml");
    if user.exists() {
        Some(user)
    } else {
        None
    }
}

/// Loads configuration from file or returns defaults.
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(root: &Path, custom_path: Option<&Path>) -> Result<Config> {
    match config_path(root, custom_path) {
        Some(path) => load_config_file(&path),
        None => Ok(Config::default()),
    }
}

/// Loads configuration from one specific file.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| BumpError::config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&config_str)
        .map_err(|e| BumpError::config(format!("invalid {}: {}", path.display(), e)))
}

/// Writes configuration back to disk.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| BumpError::config(format!("cannot serialize config: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}
