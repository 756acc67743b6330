//! Error types for frt-core

use std::path::PathBuf;

/// Result type for frt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in frt-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A rule file exists but is not valid rule JSON
    #[error("Invalid rule file {path}: {message}")]
    RuleParse { path: PathBuf, message: String },

    /// A rule file names a strategy this build does not know
    #[error("Unknown strategy '{strategy}' in {path}")]
    UnknownStrategy { path: PathBuf, strategy: String },

    /// A pattern in a rule file is not a valid glob
    #[error("Invalid pattern '{pattern}' in {path}: {message}")]
    InvalidPattern {
        path: PathBuf,
        pattern: String,
        message: String,
    },

    /// A planned operation no longer matches the filesystem
    #[error("Precondition failed for {path}: {message}")]
    Precondition { path: PathBuf, message: String },

    /// Content could not be digested or stored in the backup store
    #[error("Integrity error for {path}: {message}")]
    Integrity { path: PathBuf, message: String },

    /// A catalog entry is missing, corrupt, or cannot be written
    #[error("Catalog error for '{entry}': {message}")]
    Catalog { entry: String, message: String },

    /// No backup exists for a digest a restore depends on
    #[error("No backup found for digest {digest}")]
    BackupMissing { digest: String },

    /// A record carries no digest where a restore needs one
    #[error("Record for {path} carries no {field}")]
    MissingSign { path: PathBuf, field: &'static str },

    /// A configured root directory does not exist
    #[error("Directory not found: {path}")]
    RootNotFound { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from frt-fs
    #[error(transparent)]
    Fs(#[from] frt_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a catalog error for `entry`.
    pub fn catalog(entry: impl Into<String>, message: impl ToString) -> Self {
        Self::Catalog {
            entry: entry.into(),
            message: message.to_string(),
        }
    }

    /// Build an integrity error for `path`.
    pub fn integrity(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Integrity {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
