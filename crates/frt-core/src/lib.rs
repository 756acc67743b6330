//! Core of the FRT tree synchronizer
//!
//! This crate turns a staging tree into a target tree under cascading
//! per-directory rules, and makes every run reversible:
//!
//! - **Rules**: each directory may carry a rule file; rules cascade to
//!   subfolders when they ask to
//! - **Planning**: a depth-first walk pairs staging and target content and
//!   produces a [`Plan`] without touching the disk
//! - **Apply**: the [`Executor`] performs the plan, backing up everything it
//!   overwrites or deletes into the content-addressed [`BackupStore`]
//! - **Catalog**: every run is persisted by the [`RecordStore`]
//! - **Restore**: the [`RestoreEngine`] undoes a run, and can roll its own
//!   work back when it cannot finish
//!
//! # Architecture
//!
//! ```text
//!                    frt-cli
//!                       |
//!                  SyncService
//!                       |
//!   +--------+----------+---------+----------+
//!   |        |          |         |          |
//! Planner Executor BackupStore RecordStore RestoreEngine
//!   |
//! rules, tree, strategy, context
//!                       |
//!                    frt-fs
//! ```

pub mod backup;
pub mod catalog;
pub mod config;
pub mod confirm;
pub mod context;
pub mod error;
pub mod executor;
pub mod planner;
pub mod record;
pub mod restore;
pub mod rules;
pub mod service;
pub mod strategy;
pub mod tree;

pub use backup::BackupStore;
pub use catalog::{CatalogEntry, CatalogFailure, CatalogListing, EntryRemoval, RecordStore};
pub use config::{CONFIG_FILE_NAMES, WorkspaceConfig};
pub use confirm::{AutoConfirm, Confirm, Prompt};
pub use context::OperationContext;
pub use error::{Error, Result};
pub use executor::Executor;
pub use planner::{Plan, Planner, Skip, Visit};
pub use record::{OperationRecord, OperationType, ProcessingResult};
pub use restore::{RestoreEngine, RestoreResult, RestoreState};
pub use rules::{MatchRule, RuleResolver};
pub use service::SyncService;
pub use strategy::{ContentUnit, NameVersionInspector, StrategyType, UnitInspector};
pub use tree::{FileNode, FileTree, NodeKind};
