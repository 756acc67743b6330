//! Filesystem primitives for the FRT tree synchronizer
//!
//! Provides slash-normalized paths, atomic writes, streaming content
//! checksums and format-agnostic configuration loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{compute_bytes_checksum, compute_file_checksum, checksum_hex};
pub use config::ConfigStore;
pub use constants::FrtPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
