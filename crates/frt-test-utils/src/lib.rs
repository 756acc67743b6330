//! Shared test utilities for the FRT workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not
//! each rebuild staging and target trees by hand. It is a dev-dependency
//! only and never published.
//!
//! # Modules
//!
//! - [`tree`] - write and snapshot small directory trees
//! - [`workspace`] - [`TestWorkspace`] with staging, target, delete and
//!   backup directories

pub mod tree;
pub mod workspace;

pub use workspace::TestWorkspace;
