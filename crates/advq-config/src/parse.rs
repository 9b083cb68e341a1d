//! Configuration file parsing.
//!
//! Parses individual `.advq.toml` files into `RawConfig` values whose fields
//! are all optional, so partial files can be merged.

use std::{fs, path::Path};

use serde::Deserialize;
#[cfg(test)]
use toml::de::Error as TomlError;

use crate::ConfigError;

/// Raw configuration as parsed directly from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// When true, stop discovery here and ignore parent and global configs.
    pub root: Option<bool>,
    /// `[compile]` section.
    pub compile: Option<RawCompileSettings>,
    /// `[output]` section.
    pub output: Option<RawOutputSettings>,
}

/// Raw compile settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCompileSettings {
    /// User whose stars and ratings per-user fields refer to.
    pub username: Option<String>,
    /// Media type scope name.
    pub scope: Option<String>,
    /// Default ordering list.
    pub order: Option<String>,
    /// Table named in assembled statements.
    pub table: Option<String>,
    /// Column list selected in assembled statements.
    pub columns: Option<String>,
}

/// Raw output settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOutputSettings {
    /// Emit JSON instead of text.
    pub json: Option<bool>,
}

/// Parses a configuration file from disk.
pub fn parse_config_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config_str(&contents, path)
}

/// Parses configuration from a TOML string; `path` is only used in errors.
pub fn parse_config_str(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a TOML string without path context.
#[cfg(test)]
pub fn parse_config(contents: &str) -> Result<RawConfig, TomlError> {
    toml::from_str(contents)
}

/// Checks if a config file has `root = true` set.
///
/// Unreadable or malformed files count as not root; loading reports them.
pub fn is_root_config(path: &Path) -> bool {
    let Ok(contents) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(config) = toml::from_str::<RawConfig>(&contents) else {
        return false;
    };
    config.root == Some(true)
}
