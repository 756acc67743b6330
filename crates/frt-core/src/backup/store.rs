//! Backup store implementation

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use frt_fs::constants::TEMP_SUFFIX;
use frt_fs::io::{copy_file, temp_path_for};
use frt_fs::{FrtPath, checksum_hex, compute_file_checksum};

use crate::{Error, Result};

/// Prefix of in-flight copies inside `objects/`
const INCOMING_PREFIX: &str = ".incoming-";

/// Digest-addressed blob store rooted at `<backup>/objects`
///
/// Blobs live at `objects/<first-2-hex>/<remaining-hex>`. The digest map is
/// built on first use by hashing every blob found on disk, so blobs whose
/// name and content disagree are still found by their real digest.
#[derive(Debug)]
pub struct BackupStore {
    objects_dir: PathBuf,
    index: Option<BTreeMap<String, PathBuf>>,
    incoming: u64,
}

impl BackupStore {
    /// Open the store under `backup_root`. Nothing is read until first use.
    pub fn open(backup_root: &Path) -> Self {
        Self {
            objects_dir: backup_root.join(FrtPath::ObjectsDir),
            index: None,
            incoming: 0,
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn index(&mut self) -> &mut BTreeMap<String, PathBuf> {
        self.index
            .get_or_insert_with(|| load_index(&self.objects_dir))
    }

    /// Digest of the file at `path`.
    pub fn digest(&self, path: &Path) -> Result<String> {
        Ok(compute_file_checksum(path)?)
    }

    /// Copy `path` into the store and return the digest of the stored copy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Integrity`] when the copy cannot be digested or
    /// filed, and an I/O error when `path` cannot be read.
    pub fn add(&mut self, path: &Path) -> Result<String> {
        self.add_tracked(path).map(|(digest, _)| digest)
    }

    /// Like [`BackupStore::add`], also reporting whether the digest was new.
    pub fn add_tracked(&mut self, path: &Path) -> Result<(String, bool)> {
        fs::create_dir_all(&self.objects_dir)?;
        self.incoming += 1;
        let incoming = self.objects_dir.join(format!(
            "{}{}-{}{}",
            INCOMING_PREFIX,
            std::process::id(),
            self.incoming,
            TEMP_SUFFIX
        ));

        let filed = copy_file(path, &incoming)
            .map_err(Error::from)
            .and_then(|_| self.file_incoming(&incoming));
        if filed.is_err() && incoming.exists() {
            if let Err(e) = fs::remove_file(&incoming) {
                tracing::warn!(path = %incoming.display(), error = %e, "failed to remove incoming copy");
            }
        }
        filed
    }

    fn file_incoming(&mut self, incoming: &Path) -> Result<(String, bool)> {
        let digest =
            compute_file_checksum(incoming).map_err(|e| Error::integrity(incoming, e))?;
        let hex = checksum_hex(&digest)
            .ok_or_else(|| Error::integrity(incoming, format!("unusable digest {digest}")))?;
        let blob = self.objects_dir.join(&hex[..2]).join(&hex[2..]);

        let known = self.index().get(&digest).is_some_and(|p| p.is_file());
        if known {
            fs::remove_file(incoming)?;
            tracing::debug!(%digest, "backup already stored");
            return Ok((digest, false));
        }

        let prefix_dir = self.objects_dir.join(&hex[..2]);
        fs::create_dir_all(&prefix_dir).map_err(|e| Error::integrity(&prefix_dir, e))?;
        fs::rename(incoming, &blob).map_err(|e| Error::integrity(&blob, e))?;
        self.index().insert(digest.clone(), blob);
        tracing::debug!(%digest, "backup stored");
        Ok((digest, true))
    }

    /// Path of the blob stored for `digest`.
    pub fn lookup(&mut self, digest: &str) -> Option<PathBuf> {
        self.index().get(digest).cloned()
    }

    pub fn contains(&mut self, digest: &str) -> bool {
        self.index().contains_key(digest)
    }

    pub fn len(&mut self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.index().is_empty()
    }

    /// Every stored digest, sorted.
    pub fn digests(&mut self) -> Vec<String> {
        self.index().keys().cloned().collect()
    }

    /// Delete the blob stored for `digest`.
    ///
    /// Returns `false` when the digest was not stored.
    pub fn remove(&mut self, digest: &str) -> Result<bool> {
        let Some(blob) = self.index().remove(digest) else {
            return Ok(false);
        };
        match fs::remove_file(&blob) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                self.index().insert(digest.to_string(), blob.clone());
                return Err(frt_fs::Error::io(&blob, e).into());
            }
        }
        if let Some(prefix_dir) = blob.parent() {
            // Only succeeds once the shard is empty.
            let _ = fs::remove_dir(prefix_dir);
        }
        tracing::debug!(%digest, "backup removed");
        Ok(true)
    }

    /// Write the blob for `digest` to `target`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackupMissing`] when no blob is stored for `digest`.
    pub fn copy_out(&mut self, digest: &str, target: &Path) -> Result<()> {
        let blob = self
            .lookup(digest)
            .ok_or_else(|| Error::BackupMissing {
                digest: digest.to_string(),
            })?;
        let staged = temp_path_for(target);
        let copied = copy_file(&blob, &staged)
            .and_then(|_| fs::rename(&staged, target).map_err(|e| frt_fs::Error::io(target, e)));
        if copied.is_err() && staged.exists() {
            if let Err(e) = fs::remove_file(&staged) {
                tracing::warn!(path = %staged.display(), error = %e, "failed to remove temp file");
            }
        }
        copied?;
        Ok(())
    }
}

fn load_index(objects_dir: &Path) -> BTreeMap<String, PathBuf> {
    let mut index = BTreeMap::new();
    let mut pending = vec![objects_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                if dir != objects_dir || e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(dir = %dir.display(), error = %e, "unreadable backup directory");
                }
                continue;
            }
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let in_flight = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(INCOMING_PREFIX) || n.ends_with(TEMP_SUFFIX));
            if in_flight {
                continue;
            }
            match compute_file_checksum(&path) {
                Ok(digest) => {
                    index.insert(digest, path);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "unreadable backup blob"),
            }
        }
    }
    tracing::debug!(blobs = index.len(), dir = %objects_dir.display(), "backup index loaded");
    index
}
