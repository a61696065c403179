//! Tool configuration: where the SDK import libraries live.
//!
//! The config can be read from a JSON or YAML file; frontends then layer their
//! own overrides (command-line flags) on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::LIBRARY_FILE_NAME;

/// SDK core directory used when nothing else is configured.
pub const DEFAULT_SDK_ROOT: &str = "~/.pebble-sdk/SDKs/current/sdk-core";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format for {path} (expected .json, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },
}

/// Serializable tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// SDK core directory; `~` expands to the home directory.
    #[serde(default = "default_sdk_root")]
    pub sdk_root: String,
    /// Per-platform import library paths, overriding the SDK layout.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lib_paths: BTreeMap<String, String>,
    /// Only fail a run when every platform failed.
    #[serde(default)]
    pub single_failures: bool,
}

fn default_sdk_root() -> String {
    DEFAULT_SDK_ROOT.to_string()
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self { sdk_root: default_sdk_root(), lib_paths: BTreeMap::new(), single_failures: false }
    }
}

impl ToolConfig {
    /// Import library for `platform`: an explicit override, or
    /// `<sdk_root>/pebble/<platform>/lib/libpebble.a`.
    pub fn library_path(&self, platform: &str) -> PathBuf {
        match self.lib_paths.get(platform) {
            Some(path) => expand_home(path),
            None => expand_home(&self.sdk_root)
                .join("pebble")
                .join(platform)
                .join("lib")
                .join(LIBRARY_FILE_NAME),
        }
    }
}

/// Load a config file, choosing the parser by extension.
pub fn load_tool_config(path: impl AsRef<Path>) -> Result<ToolConfig, ConfigError> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default().to_lowercase();
    if !matches!(ext.as_str(), "json" | "yaml" | "yml") {
        return Err(ConfigError::UnsupportedFormat { path: path.to_path_buf() });
    }
    let body = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let config = if ext == "json" {
        serde_json::from_str(&body)?
    } else {
        serde_yaml::from_str(&body)?
    };
    Ok(config)
}

/// Expand a leading `~` to `$HOME`. Paths without it are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => PathBuf::from(path),
    }
}
