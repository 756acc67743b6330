//! Names of the directories FRT manages inside a backup root.

use std::path::Path;

/// Suffix carried by every in-flight temp file.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Well-known entries below the backup root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrtPath {
    /// The `objects` directory (content-addressed backup copies)
    ObjectsDir,
    /// The `record` directory (persisted run catalog)
    RecordDir,
}

impl FrtPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectsDir => "objects",
            Self::RecordDir => "record",
        }
    }
}

impl AsRef<Path> for FrtPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for FrtPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for FrtPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
