//! Integration tests for advq-config.
//!
//! Exercises discovery, parsing and merging through `Config::load`. Every
//! fixture tree marks its outermost file `root = true` so a real global
//! config on the test machine cannot leak in.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use advq_config::{CONFIG_FILENAME, Config, ConfigError, ConfigWarning, local_template};
use advq_sql::Scope;

struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn create_dir(&self, rel_path: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn create_config(&self, rel_dir: &str, content: &str) -> PathBuf {
        let path = self.create_dir(rel_dir).join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_load_single_config() {
    let env = TestEnv::new();
    env.create_config(
        "",
        r#"
root = true

[compile]
username = "alice"
scope = "songs"
order = "-ranking"
"#,
    );

    let config = Config::load(env.path()).unwrap();
    assert_eq!(config.compile.username, "alice");
    assert_eq!(config.scope(), Scope::Songs);
    assert_eq!(config.compile.order, "-ranking");
    assert_eq!(config.compile.table, "media_file");
    assert_eq!(config.config_root.as_deref(), Some(env.path()));
    assert!(config.validate().is_empty());
}

#[test]
fn test_load_nested_configs_merging() {
    let env = TestEnv::new();
    env.create_config(
        "",
        r#"
root = true

[compile]
username = "alice"
columns = "media_file.id, media_file.title"

[output]
json = true
"#,
    );
    let project = env.create_config("library", "[compile]\nusername = \"bob\"\n");
    let deep = env.create_dir("library/rock/70s");

    let config = Config::load(&deep).unwrap();
    assert_eq!(config.compile.username, "bob");
    assert_eq!(config.compile.columns, "media_file.id, media_file.title");
    assert!(config.output.json);
    assert_eq!(config.sources.first(), Some(&project));
    assert_eq!(config.sources.len(), 2);
}

#[test]
fn test_root_config_hides_parents() {
    let env = TestEnv::new();
    env.create_config("", "root = true\n[compile]\nusername = \"outer\"\n");
    env.create_config("inner", "root = true\n[compile]\norder = \"year\"\n");

    let config = Config::load(&env.path().join("inner")).unwrap();
    assert_eq!(config.compile.username, "admin");
    assert_eq!(config.compile.order, "year");
}

#[test]
fn test_malformed_file_is_an_error() {
    let env = TestEnv::new();
    env.create_config("", "root = true\n[compile\n");

    let err = Config::load(env.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
}

#[test]
fn test_load_from_missing_file() {
    let env = TestEnv::new();
    let missing = env.path().join(CONFIG_FILENAME);
    let err = Config::load_from_files(&[missing]).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_warnings_for_bad_values() {
    let env = TestEnv::new();
    env.create_config(
        "",
        "root = true\n[compile]\nscope = \"videos\"\norder = \"-colour\"\n",
    );

    let warnings = Config::load(env.path()).unwrap().validate();
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0], ConfigWarning::UnknownScope { .. }));
    assert!(matches!(warnings[1], ConfigWarning::UnknownOrderField { .. }));
}

#[test]
fn test_uncommented_template_loads() {
    let env = TestEnv::new();
    let uncommented: String = local_template()
        .lines()
        .map(|line| line.strip_prefix("# ").unwrap_or(line))
        .filter(|line| line.starts_with('[') || line.contains(" = "))
        .map(|line| format!("{line}\n"))
        .collect();
    env.create_config("", &uncommented);

    let config = Config::load(env.path()).unwrap();
    assert_eq!(config.scope(), Scope::Songs);
    assert_eq!(config.compile.order, "-lastplayed");
    assert!(config.validate().is_empty());
}

#[test]
fn test_effective_settings_round_trip() {
    let env = TestEnv::new();
    env.create_config("", "root = true\n[compile]\nusername = \"zoe\"\n");
    let config = Config::load(env.path()).unwrap();

    let rendered = config.settings_to_toml().unwrap();
    let again = env.create_config("copy", &format!("root = true\n{rendered}"));
    let reloaded = Config::load_from_files(&[again]).unwrap();
    assert_eq!(reloaded.compile, config.compile);
    assert_eq!(reloaded.output, config.output);
}
