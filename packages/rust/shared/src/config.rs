//! Project configuration for docscope.
//!
//! Optional project config lives at `<root>/docscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocscopeError, Result};
use crate::types::{DEFAULT_AUDIENCE_TARGET, DEFAULT_MANIFEST_FILE, DEFAULT_VISIBILITY_TARGET};

/// Default configuration file name, looked up at the source root.
pub const CONFIG_FILE_NAME: &str = "docscope.toml";

// ---------------------------------------------------------------------------
// Config structs (matching docscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level project config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Shared assets copied verbatim into every build.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output base directory, relative to the source root.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Navigation manifest file name at the source root.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Target used by the visibility pipeline when none is given.
    #[serde(default = "default_visibility_target")]
    pub visibility_target: String,

    /// Target used by the audience pipeline when none is given.
    #[serde(default = "default_audience_target")]
    pub audience_target: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            manifest: default_manifest(),
            visibility_target: default_visibility_target(),
            audience_target: default_audience_target(),
        }
    }
}

fn default_output_dir() -> String {
    "build".into()
}
fn default_manifest() -> String {
    DEFAULT_MANIFEST_FILE.into()
}
fn default_visibility_target() -> String {
    DEFAULT_VISIBILITY_TARGET.into()
}
fn default_audience_target() -> String {
    DEFAULT_AUDIENCE_TARGET.into()
}

/// `[assets]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Folders copied recursively, relative to the source root.
    #[serde(default = "default_asset_folders")]
    pub folders: Vec<String>,

    /// Single files copied to the same relative path.
    #[serde(default = "default_asset_files")]
    pub files: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            folders: default_asset_folders(),
            files: default_asset_files(),
        }
    }
}

fn default_asset_folders() -> Vec<String> {
    vec!["images".into(), "logo".into(), "snippets".into()]
}
fn default_asset_files() -> Vec<String> {
    vec![
        "favicon.svg".into(),
        "styles.css".into(),
        "api-reference/openapi.json".into(),
    ]
}

impl ProjectConfig {
    /// Check values that would otherwise escape the source tree or break the scan.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.output_dir.trim().is_empty() {
            return Err(DocscopeError::config("defaults.output_dir must not be empty"));
        }
        if self.defaults.manifest.trim().is_empty() {
            return Err(DocscopeError::config("defaults.manifest must not be empty"));
        }
        for entry in self.assets.folders.iter().chain(&self.assets.files) {
            if Path::new(entry).is_absolute() || entry.split(['/', '\\']).any(|s| s == "..") {
                return Err(DocscopeError::config(format!(
                    "asset path '{entry}' must be relative to the source root"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Path of the project config file under `root`.
pub fn config_file_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the project config for `root`. Returns defaults if the file does not exist.
pub fn load_config(root: &Path) -> Result<ProjectConfig> {
    let path = config_file_path(root);

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(ProjectConfig::default());
    }

    load_config_from(&path)
}

/// Load the project config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocscopeError::io(path, e))?;

    let config: ProjectConfig = toml::from_str(&content).map_err(|e| {
        DocscopeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Write a default config file under `root`. Refuses to overwrite an existing one.
/// Returns the path to the created file.
pub fn init_config(root: &Path) -> Result<PathBuf> {
    let path = config_file_path(root);
    if path.exists() {
        return Err(DocscopeError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&ProjectConfig::default())
        .map_err(|e| DocscopeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocscopeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
