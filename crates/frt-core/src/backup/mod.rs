//! Content-addressed backup storage
//!
//! Every byte sequence the executor overwrites or deletes, and every target
//! state a restore replaces, is copied here first. Blobs are named by their
//! digest, so identical content is stored once however often it is backed
//! up.

mod store;

pub use store::BackupStore;
