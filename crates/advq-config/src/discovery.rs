//! Configuration file discovery.
//!
//! Collects `.advq.toml` files from the working directory up to the
//! filesystem root, then the global `~/.advq.toml`.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::trace;

use crate::parse::is_root_config;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".advq.toml";

/// Discovers all configuration files relevant to `cwd`.
///
/// Returns paths closest-first; the global file, when present, comes last.
/// A file with `root = true` ends the walk and suppresses the global file.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();
    let mut found_root = false;

    let mut current = Some(cwd);
    while let Some(dir) = current {
        let config_path = dir.join(CONFIG_FILENAME);
        if config_path.is_file() {
            let is_root = is_root_config(&config_path);
            trace!(path = %config_path.display(), is_root, "found config file");
            configs.push(config_path);
            if is_root {
                found_root = true;
                break;
            }
        }
        current = dir.parent();
    }

    if !found_root
        && let Some(global_path) = global_config_path()
        && global_path.is_file()
        && !configs.contains(&global_path)
    {
        configs.push(global_path);
    }

    configs
}

/// Returns the path of the global configuration file (`~/.advq.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Checks if a path is the global configuration file.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    struct TestDir {
        root: tempfile::TempDir,
    }

    impl TestDir {
        fn new() -> Self {
            Self {
                root: tempfile::tempdir().unwrap(),
            }
        }

        fn create_dir(&self, rel_path: &str) -> PathBuf {
            let path = self.root.path().join(rel_path);
            fs::create_dir_all(&path).unwrap();
            path
        }

        fn create_config(&self, rel_path: &str, content: &str) -> PathBuf {
            let dir = self.create_dir(rel_path);
            let config = dir.join(CONFIG_FILENAME);
            fs::write(&config, content).unwrap();
            config
        }
    }

    fn local(configs: &[PathBuf]) -> Vec<&PathBuf> {
        configs.iter().filter(|p| !is_global_config(p)).collect()
    }

    #[test]
    fn test_discover_none() {
        let dir = TestDir::new();
        let deep = dir.create_dir("a/b/c");
        assert!(local(&discover_config_files(&deep)).is_empty());
    }

    #[test]
    fn test_discover_closest_first() {
        let dir = TestDir::new();
        let outer = dir.create_config("", "# outer\n");
        let inner = dir.create_config("music", "# inner\n");
        let deep = dir.create_dir("music/rock/70s");

        let configs = discover_config_files(&deep);
        assert_eq!(local(&configs), vec![&inner, &outer]);
    }

    #[test]
    fn test_discover_skips_directory_named_like_config() {
        let dir = TestDir::new();
        dir.create_dir(CONFIG_FILENAME);
        let sub = dir.create_dir("sub");
        assert!(local(&discover_config_files(&sub)).is_empty());
    }

    #[test]
    fn test_root_config_stops_discovery() {
        let dir = TestDir::new();
        dir.create_config("", "# ignored\n");
        let root = dir.create_config("project", "root = true\n");
        let work = dir.create_dir("project/src");

        let configs = discover_config_files(&work);
        assert_eq!(configs, vec![root]);
    }

    #[test]
    fn test_root_false_keeps_walking() {
        let dir = TestDir::new();
        let outer = dir.create_config("", "# outer\n");
        let mid = dir.create_config("project", "root = false\n");
        let work = dir.create_dir("project/src");

        let configs = discover_config_files(&work);
        assert_eq!(local(&configs), vec![&mid, &outer]);
    }

    #[test]
    fn test_global_path_uses_config_filename() {
        if let Some(path) = global_config_path() {
            assert!(path.ends_with(CONFIG_FILENAME));
            assert!(is_global_config(&path));
        }
        assert!(!is_global_config(Path::new("/elsewhere/.advq.toml")));
    }
}
