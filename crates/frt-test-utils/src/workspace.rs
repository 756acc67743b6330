//! [`TestWorkspace`] builder for synchronizer test scenarios.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::tree::{snapshot, write_file};

/// A temporary workspace with the default directory layout:
/// `update/`, `target/`, `delete/` and `old/` under one root.
///
/// # Example
///
/// ```rust,no_run
/// use frt_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.rule("lib", r#"{"strategyType":"FileName","patterns":["*.jar"]}"#);
/// ws.stage("lib/a.jar", "v2");
/// ws.target_file("lib/a.jar", "v1");
/// ws.assert_target("lib/a.jar", "v1");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create the workspace with empty staging, target and delete trees.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["update", "target", "delete"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        Self { temp_dir }
    }

    /// Return the root path of the workspace.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn staging(&self) -> PathBuf {
        self.root().join("update")
    }

    pub fn target(&self) -> PathBuf {
        self.root().join("target")
    }

    pub fn delete_tree(&self) -> PathBuf {
        self.root().join("delete")
    }

    pub fn backup(&self) -> PathBuf {
        self.root().join("old")
    }

    /// Write a staging file.
    pub fn stage(&self, relative: &str, content: impl AsRef<[u8]>) {
        write_file(&self.staging(), relative, content);
    }

    /// Write a target file.
    pub fn target_file(&self, relative: &str, content: impl AsRef<[u8]>) {
        write_file(&self.target(), relative, content);
    }

    /// Write a delete-tree marker naming `relative` for deletion.
    pub fn mark_deleted(&self, relative: &str) {
        write_file(&self.delete_tree(), relative, "");
    }

    /// Write `matching-rules.json` into `dir` of the staging tree.
    pub fn rule(&self, dir: &str, json: &str) {
        let relative = if dir.is_empty() {
            "matching-rules.json".to_string()
        } else {
            format!("{dir}/matching-rules.json")
        };
        write_file(&self.staging(), &relative, json);
    }

    /// Write `matching-rules.json` into `dir` of the delete tree.
    pub fn delete_rule(&self, dir: &str, json: &str) {
        let relative = if dir.is_empty() {
            "matching-rules.json".to_string()
        } else {
            format!("{dir}/matching-rules.json")
        };
        write_file(&self.delete_tree(), &relative, json);
    }

    /// Write a `frt.toml` pointing at the default layout.
    pub fn write_config(&self) -> PathBuf {
        let path = self.root().join("frt.toml");
        fs::write(
            &path,
            "staging_dir = \"update\"\ntarget_dir = \"target\"\ndelete_dir = \"delete\"\nbackup_dir = \"old\"\n",
        )
        .unwrap();
        path
    }

    /// Snapshot of every file in the target tree.
    pub fn target_snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        snapshot(&self.target())
    }

    /// Contents of a target file.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_target(&self, relative: &str) -> String {
        let path = self.target().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Assert that the target file `relative` holds exactly `content`.
    ///
    /// # Panics
    /// Panics with a descriptive message on mismatch.
    pub fn assert_target(&self, relative: &str, content: &str) {
        let actual = self.read_target(relative);
        assert_eq!(
            actual, content,
            "target/{relative} holds {actual:?}, expected {content:?}"
        );
    }

    /// Assert that the target file `relative` does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the file exists.
    pub fn assert_target_absent(&self, relative: &str) {
        let path = self.target().join(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }
}
