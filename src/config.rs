//! Render configuration.
//!
//! Options that change how a tree is written without changing what is in it.
//! They are read from a `render.toml` file; every key is optional and unknown
//! keys are rejected to catch typos early.
//!
//! ```toml
//! use_alias = false  # Name nodes by alias instead of filename
//! dir_mode = 0o755   # Permission bits for created directories
//! file_mode = 0o644  # Permission bits for generated (JSON) files
//! trace_fs = false   # Log every filesystem call
//! ```
//!
//! Static content carries its own mode and ignores `file_mode`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Options for building and rendering a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Use each node's alias, when it has one, as its name on disk.
    pub use_alias: bool,
    /// Mode for directories, including the mount point.
    pub dir_mode: u32,
    /// Mode for generated files. Static content keeps its own mode.
    pub file_mode: u32,
    /// Wrap the output filesystem in a logging decorator.
    pub trace_fs: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            use_alias: false,
            dir_mode: 0o755,
            file_mode: 0o644,
            trace_fs: false,
        }
    }
}

impl RenderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dir_mode > 0o7777 {
            return Err(ConfigError::Validation(format!(
                "dir_mode {:#o} has bits outside 0o7777",
                self.dir_mode
            )));
        }
        if self.file_mode > 0o7777 {
            return Err(ConfigError::Validation(format!(
                "file_mode {:#o} has bits outside 0o7777",
                self.file_mode
            )));
        }
        // Without owner write and execute, nothing could be created inside.
        if self.dir_mode & 0o300 != 0o300 {
            return Err(ConfigError::Validation(format!(
                "dir_mode {:#o} must grant the owner write and execute (0o300)",
                self.dir_mode
            )));
        }
        Ok(())
    }
}

/// Parse and validate config from TOML text.
pub fn parse_config(content: &str) -> Result<RenderConfig, ConfigError> {
    let config: RenderConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the defaults; a file that exists but doesn't parse
/// or validate is an error.
pub fn load_config(path: &Path) -> Result<RenderConfig, ConfigError> {
    if !path.exists() {
        return Ok(RenderConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `render.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Treeforge Render Configuration
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Name nodes by their alias instead of their filename, for nodes that have
# one. Nodes without an alias keep their filename.
use_alias = false

# Permission bits for every directory the render creates, mount point
# included. Must grant the owner write and execute.
dir_mode = 0o755

# Permission bits for generated files such as JSON documents. Static files
# carry their own mode and ignore this.
file_mode = 0o644

# Log every filesystem call (debug on success, warn on failure). Noisy.
trace_fs = false
"##
}
