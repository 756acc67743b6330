//! Streaming content checksums
//!
//! Every digest in the workspace uses one canonical format, `sha256:<hex>`.
//! Digests identify content for deduplication and restore lookups only; they
//! carry no integrity guarantee beyond that.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Size of the read buffer used while hashing files
const BUFFER_SIZE: usize = 8 * 1024;

/// Compute the checksum of in-memory bytes.
pub fn compute_bytes_checksum(content: &[u8]) -> String {
    format!("{}{:x}", PREFIX, Sha256::digest(content))
}

/// Compute the checksum of a file's contents.
///
/// The file is read through a fixed-size buffer and never held in memory as
/// a whole.
///
/// # Errors
///
/// Returns an error if `path` is not a regular file or cannot be read.
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    if !path.is_file() {
        if !path.exists() {
            return Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).map_err(|e| Error::io(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Return the hex part of a canonical checksum.
///
/// Returns `None` when the prefix is missing or the remainder is not a
/// plausible lowercase hex digest.
pub fn checksum_hex(checksum: &str) -> Option<&str> {
    let hex = checksum.strip_prefix(PREFIX)?;
    let valid = hex.len() > 2 && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    valid.then_some(hex)
}
