//! Configuration system for advq.
//!
//! advq reads TOML files named `.advq.toml`. Files are collected by walking up
//! from the working directory, then `~/.advq.toml` is added with the lowest
//! precedence. Command-line flags override everything loaded here.

#![warn(missing_docs)]

mod discovery;
mod error;
mod merge;
mod parse;
mod templates;
mod validate;

use std::path::{Path, PathBuf};

use advq_sql::Scope;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use discovery::{CONFIG_FILENAME, discover_config_files, global_config_path, is_global_config};
pub use error::ConfigError;
pub use merge::{ParsedConfig, merge_configs};
pub use parse::{
    RawCompileSettings, RawConfig, RawOutputSettings, parse_config_file, parse_config_str,
};
pub use templates::{global_template, local_template};
pub use validate::ConfigWarning;
use validate::validate_config;

/// Merged configuration for advq.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Defaults for `advq compile`.
    pub compile: CompileSettings,
    /// Output formatting defaults.
    pub output: OutputSettings,
    /// Directory containing the most specific config file.
    pub config_root: Option<PathBuf>,
    /// Files that contributed, highest precedence first.
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Discovers and merges all configuration files relevant to `cwd`.
    ///
    /// Returns `Config::default()` if no configuration files are found.
    pub fn load(cwd: &Path) -> Result<Self, ConfigError> {
        let config_files = discover_config_files(cwd);
        debug!(cwd = %cwd.display(), files = config_files.len(), "discovered config files");
        Self::load_from_files(&config_files)
    }

    /// Loads configuration from an explicit list of files, highest
    /// precedence first.
    pub fn load_from_files(files: &[PathBuf]) -> Result<Self, ConfigError> {
        if files.is_empty() {
            return Ok(Self::default());
        }

        let parsed: Vec<ParsedConfig> = files
            .iter()
            .map(|path| {
                let config = parse_config_file(path)?;
                Ok(ParsedConfig {
                    path: path.clone(),
                    config,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(merge_configs(&parsed))
    }

    /// Validates the configuration and returns any warnings.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        validate_config(self)
    }

    /// Returns the configured scope, falling back to [`Scope::All`] when the
    /// value does not parse.
    pub fn scope(&self) -> Scope {
        self.compile.scope.parse().unwrap_or_else(|err: String| {
            warn!(%err, "ignoring configured scope");
            Scope::default()
        })
    }

    /// Serializes the effective settings as `.advq.toml` content.
    pub fn settings_to_toml(&self) -> Result<String, ConfigError> {
        let serializable = SerializableSettings {
            compile: &self.compile,
            output: &self.output,
        };
        Ok(toml::to_string_pretty(&serializable)?)
    }
}

/// Defaults for `advq compile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileSettings {
    /// User bound by per-user joins.
    pub username: String,
    /// Media type scope name.
    pub scope: String,
    /// Default ordering list; empty means no ordering.
    pub order: String,
    /// Table named in assembled statements.
    pub table: String,
    /// Column list selected in assembled statements.
    pub columns: String,
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            username: String::from("admin"),
            scope: Scope::All.to_string(),
            order: String::new(),
            table: String::from("media_file"),
            columns: String::from("media_file.*"),
        }
    }
}

/// Output formatting defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Borrowed view of the settings for TOML output.
#[derive(Serialize)]
struct SerializableSettings<'a> {
    /// `[compile]` section.
    compile: &'a CompileSettings,
    /// `[output]` section.
    output: &'a OutputSettings,
}
