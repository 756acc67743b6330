//! Atomic writes and whole-file copy helpers

use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::TEMP_SUFFIX;
use crate::{Error, NormalizedPath, Result};

/// Path of the temp file `write_atomic` stages content in.
///
/// Lives next to the destination so the final rename stays on one
/// filesystem.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}{}", name, std::process::id(), TEMP_SUFFIX))
}

/// Write content atomically to a file with locking.
///
/// Writes to a temp file in the destination directory, flushes it, then
/// renames it over the destination. On any failure the temp file is removed
/// so no partial artifact is left behind.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_path = temp_path_for(&native_path);
    let staged = stage_temp(&temp_path, &native_path, content)
        .and_then(|_| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));

    if staged.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %e, "failed to remove temp file");
        }
    }
    staged
}

fn stage_temp(temp_path: &Path, native_path: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })?;
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Copy `source` over `dest`, creating missing parent directories.
///
/// Returns the number of bytes copied.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    if !source.is_file() {
        return Err(Error::NotAFile {
            path: source.to_path_buf(),
        });
    }
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::copy(source, dest).map_err(|e| Error::io(dest, e))
}

/// Remove a regular file.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_stays_in_destination_directory() {
        let temp = temp_path_for(Path::new("/a/b/entry.json"));
        assert_eq!(temp.parent(), Some(Path::new("/a/b")));
        assert!(temp.to_string_lossy().ends_with(TEMP_SUFFIX));
    }

    #[test]
    fn copy_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        fs::write(&src, "data").unwrap();

        let dest = dir.path().join("nested/deeper/dest.txt");
        let copied = copy_file(&src, &dest).unwrap();

        assert_eq!(copied, 4);
        assert_eq!(fs::read_to_string(dest).unwrap(), "data");
    }

    #[test]
    fn copy_file_rejects_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = copy_file(&dir.path().join("missing"), &dir.path().join("out"));
        assert!(matches!(result, Err(Error::NotAFile { .. })));
        assert!(!dir.path().join("out").exists());
    }
}
