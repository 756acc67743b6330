//! Directory tree helpers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Write `content` to `root/relative`, creating parent directories.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("write_file: failed to create {}: {e}", parent.display()));
    }
    fs::write(&path, content)
        .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
}

/// Every regular file under `root`, keyed by slash-relative path.
///
/// A missing `root` yields an empty map.
///
/// # Panics
/// Panics if a directory or file cannot be read.
pub fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    if root.is_dir() {
        collect(root, "", &mut files);
    }
    files
}

fn collect(dir: &Path, prefix: &str, files: &mut BTreeMap<String, Vec<u8>>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("snapshot: failed to read {}: {e}", dir.display()));
    for entry in entries {
        let entry = entry.unwrap_or_else(|e| panic!("snapshot: bad entry: {e}"));
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();
        if path.is_dir() {
            collect(&path, &relative, files);
        } else {
            let bytes = fs::read(&path)
                .unwrap_or_else(|e| panic!("snapshot: failed to read {}: {e}", path.display()));
            files.insert(relative, bytes);
        }
    }
}
