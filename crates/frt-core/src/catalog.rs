//! Persisted run catalog
//!
//! Each applied run is written once to `<backup>/record/` as a JSON
//! [`ProcessingResult`]. The catalog is what a restore reads back, and what
//! decides which backup blobs are still needed.

use chrono::Local;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use frt_fs::constants::TEMP_SUFFIX;
use frt_fs::io::write_atomic;
use frt_fs::{FrtPath, NormalizedPath};

use crate::backup::BackupStore;
use crate::record::ProcessingResult;
use crate::{Error, Result};

const ENTRY_EXTENSION: &str = "json";

/// A catalog entry that loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub result: ProcessingResult,
}

/// A catalog entry that exists but could not be loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFailure {
    pub name: String,
    pub message: String,
}

/// Everything found in the catalog, in name order
#[derive(Debug, Clone, Default)]
pub struct CatalogListing {
    pub entries: Vec<CatalogEntry>,
    pub failures: Vec<CatalogFailure>,
}

/// Outcome of deleting a catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRemoval {
    pub name: String,
    /// Blobs deleted because no remaining entry referenced them
    pub removed: Vec<String>,
    /// Blobs kept because another entry still references them
    pub retained: Vec<String>,
}

/// Reads and writes catalog entries under `<backup>/record`
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn open(backup_root: &Path) -> Self {
        Self {
            dir: backup_root.join(FrtPath::RecordDir),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `result` and return the new entry's name.
    ///
    /// The entry is named after the result's local time,
    /// `backup-<yyyyMMdd>-<HHmmss>`, with `-N` appended if that name is
    /// taken. The write goes through a temp file and a rename, so a failed
    /// persist leaves nothing behind.
    pub fn persist(&self, result: &ProcessingResult) -> Result<String> {
        let stamp = result
            .result_time
            .with_timezone(&Local)
            .format("backup-%Y%m%d-%H%M%S")
            .to_string();
        let name = self.free_name(&stamp);

        let content = serde_json::to_vec_pretty(result).map_err(|e| Error::catalog(&name, e))?;
        write_atomic(&NormalizedPath::new(self.path_of(&name)), &content)
            .map_err(|e| Error::catalog(&name, e))?;

        tracing::info!(entry = %name, records = result.operation_records.len(), "catalog entry written");
        Ok(name)
    }

    fn free_name(&self, stamp: &str) -> String {
        let mut name = stamp.to_string();
        let mut suffix = 1;
        while self.path_of(&name).exists() {
            suffix += 1;
            name = format!("{stamp}-{suffix}");
        }
        name
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{ENTRY_EXTENSION}"))
    }

    /// Load the entry called `name` (with or without `.json`).
    pub fn load(&self, name: &str) -> Result<ProcessingResult> {
        let name = entry_name(name)?;
        let path = self.path_of(name);
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::catalog(name, "no such entry")
            } else {
                Error::catalog(name, e)
            }
        })?;
        let result: ProcessingResult =
            serde_json::from_str(&content).map_err(|e| Error::catalog(name, e))?;
        if !result.tallies_match() {
            tracing::warn!(entry = %name, "catalog entry counts disagree with its records");
        }
        Ok(result)
    }

    /// Names of all entries, sorted. Temp files are not entries.
    pub fn names(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(frt_fs::Error::io(&self.dir, e).into()),
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.ends_with(TEMP_SUFFIX))
            .filter_map(|name| {
                name.strip_suffix(&format!(".{ENTRY_EXTENSION}"))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load every entry, collecting per-entry failures instead of stopping.
    pub fn load_all(&self) -> Result<CatalogListing> {
        let mut listing = CatalogListing::default();
        for name in self.names()? {
            match self.load(&name) {
                Ok(result) => listing.entries.push(CatalogEntry { name, result }),
                Err(e) => {
                    tracing::warn!(entry = %name, error = %e, "unreadable catalog entry");
                    listing.failures.push(CatalogFailure {
                        name,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(listing)
    }

    /// Delete entry `name` and every blob only it referenced.
    ///
    /// References are recounted from the remaining catalog. When any
    /// remaining entry cannot be read, no blob is deleted, since its
    /// references are unknown.
    pub fn delete_entry(&self, name: &str, store: &mut BackupStore) -> Result<EntryRemoval> {
        let name = entry_name(name)?.to_string();
        let path = self.path_of(&name);
        if !path.is_file() {
            return Err(Error::catalog(&name, "no such entry"));
        }

        let referenced = match self.load(&name) {
            Ok(result) => result.referenced_signs(),
            Err(e) => {
                tracing::warn!(entry = %name, error = %e, "deleting unreadable entry, its blobs are kept");
                BTreeSet::new()
            }
        };
        fs::remove_file(&path).map_err(|e| Error::catalog(&name, e))?;

        let remaining = self.load_all()?;
        if !remaining.failures.is_empty() {
            tracing::warn!(
                entry = %name,
                unreadable = remaining.failures.len(),
                "unreadable entries remain, keeping all blobs"
            );
            return Ok(EntryRemoval {
                name,
                removed: Vec::new(),
                retained: referenced.into_iter().collect(),
            });
        }

        let still_used: BTreeSet<String> = remaining
            .entries
            .iter()
            .flat_map(|entry| entry.result.referenced_signs())
            .collect();

        let mut removal = EntryRemoval {
            name,
            removed: Vec::new(),
            retained: Vec::new(),
        };
        for digest in referenced {
            if still_used.contains(&digest) {
                removal.retained.push(digest);
            } else if store.remove(&digest)? {
                removal.removed.push(digest);
            }
        }
        tracing::info!(
            entry = %removal.name,
            removed = removal.removed.len(),
            retained = removal.retained.len(),
            "catalog entry deleted"
        );
        Ok(removal)
    }
}

/// Strip an optional `.json` and reject names that are not plain file names.
fn entry_name(name: &str) -> Result<&str> {
    let bare = name
        .strip_suffix(&format!(".{ENTRY_EXTENSION}"))
        .unwrap_or(name);
    let plain = !bare.is_empty()
        && !bare.contains(['/', '\\'])
        && bare != "."
        && bare != "..";
    if plain {
        Ok(bare)
    } else {
        Err(Error::catalog(name, "not a catalog entry name"))
    }
}
