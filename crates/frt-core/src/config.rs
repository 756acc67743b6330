//! Workspace configuration
//!
//! Four directories define a workspace. They are read from `frt.toml` (or
//! `.json` / `.yaml`); relative entries resolve against the canonical form
//! of the directory that holds the configuration file, so catalog entries
//! record stable absolute paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use frt_fs::{ConfigStore, NormalizedPath};

use crate::Result;

/// Configuration file names probed by [`WorkspaceConfig::discover`], in order
pub const CONFIG_FILE_NAMES: [&str; 4] = ["frt.toml", "frt.json", "frt.yaml", "frt.yml"];

/// Directory layout of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Tree supplying new and changed content
    pub staging_dir: PathBuf,
    /// Tree being synchronized
    pub target_dir: PathBuf,
    /// Tree whose files name target files to delete
    pub delete_dir: PathBuf,
    /// Backup blobs and the run catalog
    pub backup_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("update"),
            target_dir: PathBuf::from("target"),
            delete_dir: PathBuf::from("delete"),
            backup_dir: PathBuf::from("old"),
        }
    }
}

impl WorkspaceConfig {
    /// Default layout with every directory under `root`.
    pub fn rooted_at(root: &Path) -> Self {
        Self::default().resolved_against(root)
    }

    /// Load a configuration file and resolve it against its own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = ConfigStore::new().load(&NormalizedPath::new(path))?;
        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let base = anchor(parent)?;
        tracing::debug!(path = %path.display(), base = %base.display(), "workspace config loaded");
        Ok(config.resolved_against(&base))
    }

    /// Find a configuration file in `dir`, falling back to the default
    /// layout rooted at `dir`.
    pub fn discover(dir: &Path) -> Result<Self> {
        match CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        {
            Some(path) => Self::load(&path),
            None => Ok(Self::rooted_at(&anchor(dir)?)),
        }
    }

    /// Write this configuration; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(&NormalizedPath::new(path), self)?;
        Ok(())
    }

    /// Make every relative directory relative to `base`.
    pub fn resolved_against(self, base: &Path) -> Self {
        let resolve = |dir: PathBuf| {
            if dir.is_absolute() {
                dir
            } else {
                base.join(dir)
            }
        };
        Self {
            staging_dir: resolve(self.staging_dir),
            target_dir: resolve(self.target_dir),
            delete_dir: resolve(self.delete_dir),
            backup_dir: resolve(self.backup_dir),
        }
    }
}

/// Canonical absolute form of an existing workspace directory.
fn anchor(dir: &Path) -> Result<PathBuf> {
    Ok(NormalizedPath::canonicalize(dir)?.to_native())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Component;

    fn base(dir: &Path) -> PathBuf {
        anchor(dir).unwrap()
    }

    #[test]
    fn missing_keys_take_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("frt.toml");
        fs::write(&path, "target_dir = \"game\"\n").unwrap();

        let config = WorkspaceConfig::load(&path).unwrap();
        let root = base(temp.path());
        assert_eq!(config.target_dir, root.join("game"));
        assert_eq!(config.staging_dir, root.join("update"));
        assert_eq!(config.backup_dir, root.join("old"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let temp = tempfile::tempdir().unwrap();
        let elsewhere = temp.path().join("elsewhere");
        let path = temp.path().join("conf/frt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let json = serde_json::json!({ "backup_dir": elsewhere });
        fs::write(&path, json.to_string()).unwrap();

        let config = WorkspaceConfig::load(&path).unwrap();
        assert_eq!(config.backup_dir, elsewhere);
        assert_eq!(config.delete_dir, base(&temp.path().join("conf")).join("delete"));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::discover(temp.path()).unwrap();
        assert_eq!(config, WorkspaceConfig::rooted_at(&base(temp.path())));
    }

    #[test]
    fn discovered_roots_are_canonical() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let config = WorkspaceConfig::discover(&temp.path().join("sub/..")).unwrap();
        assert!(config.staging_dir.is_absolute());
        assert!(!config.staging_dir.components().any(|c| c == Component::ParentDir));
        assert_eq!(config.staging_dir, base(temp.path()).join("update"));
    }

    #[test]
    fn discover_of_missing_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        assert!(WorkspaceConfig::discover(&temp.path().join("absent")).is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("frt.toml");
        let config = WorkspaceConfig {
            target_dir: PathBuf::from("game/mods"),
            ..WorkspaceConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = WorkspaceConfig::load(&path).unwrap();
        assert_eq!(loaded, config.resolved_against(&base(temp.path())));
    }

    #[test]
    fn discover_reads_yaml() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("frt.yaml"), "staging_dir: incoming\n").unwrap();
        let config = WorkspaceConfig::discover(temp.path()).unwrap();
        assert_eq!(config.staging_dir, base(temp.path()).join("incoming"));
    }
}
