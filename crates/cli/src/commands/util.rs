use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pbw_api_core::config::{load_tool_config, ToolConfig};
use serde::Serialize;

/// Command-line overrides layered over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config: Option<PathBuf>,
    pub sdk_root: Option<String>,
    pub lib_paths: Vec<(String, String)>,
    pub single_failures: bool,
}

/// Load the optional config file and apply the command-line overrides.
pub fn resolve_tool_config(overrides: &ConfigOverrides) -> Result<ToolConfig> {
    let mut config = match &overrides.config {
        Some(path) => load_tool_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ToolConfig::default(),
    };
    if let Some(root) = &overrides.sdk_root {
        config.sdk_root = root.clone();
    }
    for (platform, path) in &overrides.lib_paths {
        config.lib_paths.insert(platform.clone(), path.clone());
    }
    config.single_failures |= overrides.single_failures;
    log::debug!("Using SDK root {}", config.sdk_root);
    Ok(config)
}

/// Write `body` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&Path>, body: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, format!("{body}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    println!("{serialized}");
    Ok(())
}
