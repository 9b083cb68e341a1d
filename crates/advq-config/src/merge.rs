//! Configuration merging.
//!
//! Folds parsed files into a single `Config`. Files are given closest-first;
//! for each setting the closest file that defines it wins.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    CompileSettings, Config, OutputSettings,
    parse::{RawCompileSettings, RawConfig, RawOutputSettings},
};

/// A parsed config file with its source path.
pub struct ParsedConfig {
    /// Path to the config file.
    pub path: PathBuf,
    /// Parsed raw configuration.
    pub config: RawConfig,
}

/// Merges parsed configuration files, highest precedence first.
pub fn merge_configs(configs: &[ParsedConfig]) -> Config {
    if configs.is_empty() {
        return Config::default();
    }

    let mut compile = CompileSettings::default();
    let mut output = OutputSettings::default();

    // Lowest precedence first so closer files overwrite.
    for parsed in configs.iter().rev() {
        if let Some(ref raw) = parsed.config.compile {
            apply_raw_compile(&mut compile, raw);
        }
        if let Some(ref raw) = parsed.config.output {
            apply_raw_output(&mut output, raw);
        }
    }

    let config_root = configs
        .first()
        .and_then(|c| c.path.parent())
        .map(Path::to_path_buf);
    debug!(files = configs.len(), "merged configuration");

    Config {
        compile,
        output,
        config_root,
        sources: configs.iter().map(|c| c.path.clone()).collect(),
    }
}

/// Applies raw compile settings, overwriting present values.
fn apply_raw_compile(result: &mut CompileSettings, raw: &RawCompileSettings) {
    if let Some(ref v) = raw.username {
        result.username = v.clone();
    }
    if let Some(ref v) = raw.scope {
        result.scope = v.clone();
    }
    if let Some(ref v) = raw.order {
        result.order = v.clone();
    }
    if let Some(ref v) = raw.table {
        result.table = v.clone();
    }
    if let Some(ref v) = raw.columns {
        result.columns = v.clone();
    }
}

/// Applies raw output settings, overwriting present values.
fn apply_raw_output(result: &mut OutputSettings, raw: &RawOutputSettings) {
    if let Some(v) = raw.json {
        result.json = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_config_str;

    fn parsed(path: &str, toml: &str) -> ParsedConfig {
        ParsedConfig {
            path: PathBuf::from(path),
            config: parse_config_str(toml, Path::new(path)).unwrap(),
        }
    }

    #[test]
    fn test_merge_empty_configs() {
        let config = merge_configs(&[]);
        assert_eq!(config.compile.username, "admin");
        assert!(config.config_root.is_none());
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_merge_single_config() {
        let config = merge_configs(&[parsed(
            "/music/.advq.toml",
            "[compile]\nusername = \"alice\"\n",
        )]);
        assert_eq!(config.compile.username, "alice");
        assert_eq!(config.compile.table, "media_file");
        assert_eq!(config.config_root, Some(PathBuf::from("/music")));
    }

    #[test]
    fn test_merge_closest_wins_per_field() {
        let config = merge_configs(&[
            parsed("/a/b/.advq.toml", "[compile]\norder = \"-year\"\n"),
            parsed(
                "/a/.advq.toml",
                "[compile]\norder = \"artist\"\nscope = \"songs\"\n[output]\njson = true\n",
            ),
        ]);
        assert_eq!(config.compile.order, "-year");
        assert_eq!(config.compile.scope, "songs");
        assert!(config.output.json);
        assert_eq!(config.config_root, Some(PathBuf::from("/a/b")));
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn test_merge_three_way() {
        let config = merge_configs(&[
            parsed("/a/b/c/.advq.toml", "[compile]\nusername = \"carol\"\n"),
            parsed("/a/b/.advq.toml", "[compile]\ncolumns = \"media_file.id\"\n"),
            parsed(
                "/home/.advq.toml",
                "[compile]\nusername = \"global\"\ntable = \"songs\"\n",
            ),
        ]);
        assert_eq!(config.compile.username, "carol");
        assert_eq!(config.compile.columns, "media_file.id");
        assert_eq!(config.compile.table, "songs");
    }
}
