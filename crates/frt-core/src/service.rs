//! The long-lived facade callers drive
//!
//! [`SyncService`] owns the backup store and the catalog for one workspace.
//! All mutable state lives here; there are no process-wide caches.

use std::path::Path;

use crate::backup::BackupStore;
use crate::catalog::{CatalogListing, EntryRemoval, RecordStore};
use crate::config::WorkspaceConfig;
use crate::confirm::Confirm;
use crate::executor::Executor;
use crate::planner::{Plan, Planner};
use crate::record::{OperationType, ProcessingResult};
use crate::restore::{RestoreEngine, RestoreResult};
use crate::strategy::{NameVersionInspector, UnitInspector};
use crate::Result;

/// Plans, applies, records and restores runs for one workspace
pub struct SyncService {
    config: WorkspaceConfig,
    planner: Planner,
    store: BackupStore,
    catalog: RecordStore,
    inspector: Box<dyn UnitInspector>,
    confirm: Box<dyn Confirm>,
}

impl SyncService {
    /// Create a service using the file-name content-unit inspector.
    pub fn new(config: WorkspaceConfig, confirm: Box<dyn Confirm>) -> Self {
        Self::with_inspector(config, confirm, Box::new(NameVersionInspector))
    }

    pub fn with_inspector(
        config: WorkspaceConfig,
        confirm: Box<dyn Confirm>,
        inspector: Box<dyn UnitInspector>,
    ) -> Self {
        let store = BackupStore::open(&config.backup_dir);
        let catalog = RecordStore::open(&config.backup_dir);
        Self {
            config,
            planner: Planner::new(),
            store,
            catalog,
            inspector,
            confirm,
        }
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn store(&mut self) -> &mut BackupStore {
        &mut self.store
    }

    pub fn catalog(&self) -> &RecordStore {
        &self.catalog
    }

    /// Plan `root` against the target tree. Never writes to disk.
    pub fn plan(&self, root: &Path, allowed: &[OperationType]) -> Result<Plan> {
        self.planner.plan(
            root,
            &self.config.target_dir,
            allowed,
            self.confirm.as_ref(),
            self.inspector.as_ref(),
        )
    }

    /// Plan a sync from the staging tree. `prune` also deletes content-units
    /// that exist only in the target.
    pub fn plan_update(&self, prune: bool) -> Result<Plan> {
        let allowed: &[OperationType] = if prune {
            &OperationType::ALL
        } else {
            &[OperationType::Add, OperationType::Replace]
        };
        self.plan(&self.config.staging_dir, allowed)
    }

    /// Plan the deletions named by the delete tree.
    pub fn plan_delete(&self) -> Result<Plan> {
        self.plan(&self.config.delete_dir, &[OperationType::Delete])
    }

    /// Apply `plan`. Individual failures are recorded, never raised.
    pub fn apply(&mut self, plan: Plan) -> ProcessingResult {
        let Plan {
            mut records, skips, ..
        } = plan;
        Executor::new(&mut self.store).apply_all(&mut records);
        let result = ProcessingResult::from_records(records, skips.len());
        tracing::info!(
            succeeded = result.success_count,
            failed = result.error_count,
            skipped = result.skip_count,
            "run applied"
        );
        result
    }

    /// Persist `result` to the catalog and return its entry name.
    pub fn commit(&self, result: &ProcessingResult) -> Result<String> {
        self.catalog.persist(result)
    }

    /// Undo the applied records of `result`.
    pub fn restore(&mut self, result: &ProcessingResult) -> RestoreResult {
        RestoreEngine::new(&mut self.store, self.confirm.as_ref()).restore(result)
    }

    /// Load catalog entry `name` and undo it.
    pub fn restore_entry(&mut self, name: &str) -> Result<RestoreResult> {
        let result = self.catalog.load(name)?;
        Ok(self.restore(&result))
    }

    pub fn list_entries(&self) -> Result<CatalogListing> {
        self.catalog.load_all()
    }

    /// Delete catalog entry `name` and the blobs only it referenced.
    pub fn delete_catalog_entry(&mut self, name: &str) -> Result<EntryRemoval> {
        self.catalog.delete_entry(name, &mut self.store)
    }
}
