//! Reversal of applied runs, with compensating rollback
//!
//! A restore walks a run's records backwards and undoes each applied one.
//! Before an undo touches a target, the target's current bytes are copied
//! into the backup store, so every completed undo can itself be reverted
//! if the restore has to be abandoned half-way.
//!
//! Captures made only for that purpose are dropped once the attempt ends
//! `Completed` or `RolledBack`. After `LeftInconsistent` they stay in the
//! store, unreferenced by any catalog entry, as the only copy of the bytes
//! the attempt overwrote; their digests are logged for manual recovery.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use frt_fs::io::remove_file;

use crate::backup::BackupStore;
use crate::confirm::{Confirm, Prompt};
use crate::record::{OperationRecord, OperationType, ProcessingResult};
use crate::{Error, Result};

/// Where a restore attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestoreState {
    Idle,
    Restoring,
    /// Every applied record was undone
    Completed,
    /// An undo failed and was not retried
    FailedAwaitingDecision,
    /// The undos of this attempt were reverted
    RolledBack,
    /// Left part-restored, by choice or because rollback failed
    LeftInconsistent,
}

/// Outcome of one restore attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResult {
    pub restore_time: DateTime<Utc>,
    pub success_count: usize,
    pub failure_count: usize,
    pub rollback_count: usize,
    pub partial_restore: bool,
    pub failure_messages: Vec<String>,
    pub state: RestoreState,
}

impl RestoreResult {
    fn new() -> Self {
        Self {
            restore_time: Utc::now(),
            success_count: 0,
            failure_count: 0,
            rollback_count: 0,
            partial_restore: false,
            failure_messages: Vec::new(),
            state: RestoreState::Idle,
        }
    }
}

/// How to revert one completed undo
#[derive(Debug, Clone, PartialEq, Eq)]
enum Compensation {
    /// Put the captured bytes back
    Rewrite { target: PathBuf, digest: String },
    /// The undo created the target; remove it
    Remove { target: PathBuf },
    /// The undo changed nothing
    Nothing,
}

/// Undoes the applied records of a [`ProcessingResult`]
pub struct RestoreEngine<'a> {
    store: &'a mut BackupStore,
    confirm: &'a dyn Confirm,
    state: RestoreState,
    fresh: Vec<String>,
}

impl<'a> RestoreEngine<'a> {
    pub fn new(store: &'a mut BackupStore, confirm: &'a dyn Confirm) -> Self {
        Self {
            store,
            confirm,
            state: RestoreState::Idle,
            fresh: Vec::new(),
        }
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    /// Undo every applied record of `result`, last first.
    ///
    /// When an undo fails the confirmation callback is asked whether to
    /// retry it and, if not, whether to roll back what this attempt already
    /// restored. Failures are reported in the returned result, never raised.
    pub fn restore(&mut self, result: &ProcessingResult) -> RestoreResult {
        let mut outcome = RestoreResult::new();
        self.state = RestoreState::Restoring;
        self.fresh.clear();
        let mut completed: Vec<Compensation> = Vec::new();

        for record in result.operation_records.iter().rev() {
            if !record.success {
                tracing::debug!(target = %record.target_path.display(), "not applied, nothing to undo");
                continue;
            }
            loop {
                match self.undo(record) {
                    Ok(compensation) => {
                        tracing::info!(
                            operation = %record.operation_type,
                            target = %record.target_path.display(),
                            "undone"
                        );
                        outcome.success_count += 1;
                        completed.push(compensation);
                        break;
                    }
                    Err(e) => {
                        let message = format!(
                            "undo {} {}: {}",
                            record.operation_type,
                            record.target_path.display(),
                            e
                        );
                        tracing::error!("{message}");
                        let retry = Prompt::RetryUndo {
                            operation: record.operation_type,
                            target: &record.target_path,
                            error: &message,
                        };
                        if self.confirm.confirm(&retry) {
                            continue;
                        }
                        outcome.failure_count += 1;
                        outcome.partial_restore = true;
                        outcome.failure_messages.push(message);
                        self.state = RestoreState::FailedAwaitingDecision;
                        self.decide(completed, &mut outcome);
                        outcome.state = self.state;
                        if self.state == RestoreState::LeftInconsistent && !self.fresh.is_empty() {
                            tracing::warn!(
                                captures = ?self.fresh,
                                "restore left part-way, captured bytes kept in the backup store"
                            );
                        }
                        return outcome;
                    }
                }
            }
        }

        self.state = RestoreState::Completed;
        self.discard_fresh();
        outcome.state = self.state;
        tracing::info!(restored = outcome.success_count, "restore complete");
        outcome
    }

    fn decide(&mut self, completed: Vec<Compensation>, outcome: &mut RestoreResult) {
        let error = outcome.failure_messages.last().cloned().unwrap_or_default();
        let prompt = Prompt::Rollback {
            completed: completed.len(),
            error: &error,
        };
        if !self.confirm.confirm(&prompt) {
            tracing::warn!("restore left part-way by request");
            self.state = RestoreState::LeftInconsistent;
            return;
        }

        for compensation in completed.iter().rev() {
            match self.compensate(compensation) {
                Ok(()) => outcome.rollback_count += 1,
                Err(e) => {
                    let message = format!("rollback: {e}");
                    tracing::error!("{message}");
                    outcome.failure_messages.push(message);
                    self.state = RestoreState::LeftInconsistent;
                    return;
                }
            }
        }
        self.state = RestoreState::RolledBack;
        self.discard_fresh();
        tracing::info!(reverted = outcome.rollback_count, "restore rolled back");
    }

    /// Undo one record. A deleted target that exists again is left as it
    /// is, without consulting its backup.
    fn undo(&mut self, record: &OperationRecord) -> Result<Compensation> {
        let target = &record.target_path;
        match record.operation_type {
            OperationType::Add => {
                if !target.exists() {
                    return Ok(Compensation::Nothing);
                }
                let captured = self.capture(target)?;
                remove_file(target)?;
                Ok(captured)
            }
            OperationType::Replace => {
                let digest = backup_sign(record)?;
                self.require_backup(digest)?;
                let captured = if target.exists() {
                    self.capture(target)?
                } else {
                    Compensation::Remove {
                        target: target.clone(),
                    }
                };
                self.store.copy_out(digest, target)?;
                Ok(captured)
            }
            OperationType::Delete => {
                if target.exists() {
                    return Ok(Compensation::Nothing);
                }
                let digest = backup_sign(record)?;
                self.store.copy_out(digest, target)?;
                Ok(Compensation::Remove {
                    target: target.clone(),
                })
            }
        }
    }

    fn require_backup(&mut self, digest: &str) -> Result<()> {
        if self.store.contains(digest) {
            Ok(())
        } else {
            Err(Error::BackupMissing {
                digest: digest.to_string(),
            })
        }
    }

    /// Store the current bytes of `target` so the undo can be reverted.
    fn capture(&mut self, target: &Path) -> Result<Compensation> {
        let (digest, fresh) = self.store.add_tracked(target)?;
        if fresh {
            self.fresh.push(digest.clone());
        }
        Ok(Compensation::Rewrite {
            target: target.to_path_buf(),
            digest,
        })
    }

    fn compensate(&mut self, compensation: &Compensation) -> Result<()> {
        match compensation {
            Compensation::Rewrite { target, digest } => self.store.copy_out(digest, target),
            Compensation::Remove { target } => {
                if target.exists() {
                    remove_file(target)?;
                }
                Ok(())
            }
            Compensation::Nothing => Ok(()),
        }
    }

    /// Drop the captures this attempt added to the store.
    fn discard_fresh(&mut self) {
        for digest in std::mem::take(&mut self.fresh) {
            if let Err(e) = self.store.remove(&digest) {
                tracing::warn!(%digest, error = %e, "failed to discard restore capture");
            }
        }
    }
}

fn backup_sign(record: &OperationRecord) -> Result<&str> {
    record
        .target_file_sign
        .as_deref()
        .ok_or_else(|| Error::MissingSign {
            path: record.target_path.clone(),
            field: "targetFileSign",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use crate::strategy::StrategyType;
    use frt_fs::compute_bytes_checksum;
    use std::fs;

    fn applied(op: OperationType, target: &Path, target_sign: Option<String>) -> OperationRecord {
        let mut r = OperationRecord::planned(StrategyType::FileName, op, "u/x", target)
            .with_signs(None, target_sign);
        r.succeed();
        r
    }

    #[test]
    fn undoes_add_and_delete() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(&temp.path().join("old"));
        let added = temp.path().join("t/added.txt");
        let deleted = temp.path().join("t/deleted.txt");
        fs::create_dir_all(added.parent().unwrap()).unwrap();
        fs::write(&added, "new").unwrap();
        fs::write(temp.path().join("seed"), "kept").unwrap();
        let sign = store.add(&temp.path().join("seed")).unwrap();

        let result = ProcessingResult::from_records(
            vec![
                applied(OperationType::Add, &added, None),
                applied(OperationType::Delete, &deleted, Some(sign)),
            ],
            0,
        );
        let confirm = AutoConfirm(false);
        let outcome = RestoreEngine::new(&mut store, &confirm).restore(&result);

        assert_eq!(outcome.state, RestoreState::Completed);
        assert_eq!(outcome.success_count, 2);
        assert!(!added.exists());
        assert_eq!(fs::read_to_string(&deleted).unwrap(), "kept");
        // The capture of "new" was only needed during the attempt.
        assert!(!store.contains(&compute_bytes_checksum(b"new")));
    }

    #[test]
    fn failed_records_are_not_undone() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(temp.path());
        let target = temp.path().join("untouched.txt");
        fs::write(&target, "stay").unwrap();

        let mut record = applied(OperationType::Add, &target, None);
        record.fail("copy failed");
        let result = ProcessingResult::from_records(vec![record], 0);

        let confirm = AutoConfirm(true);
        let outcome = RestoreEngine::new(&mut store, &confirm).restore(&result);
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.state, RestoreState::Completed);
        assert!(target.exists());
    }

    #[test]
    fn missing_backup_without_rollback_leaves_inconsistent() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(temp.path());
        let target = temp.path().join("t.txt");
        fs::write(&target, "v2").unwrap();

        let result = ProcessingResult::from_records(
            vec![applied(
                OperationType::Replace,
                &target,
                Some(compute_bytes_checksum(b"v1")),
            )],
            0,
        );
        let confirm = AutoConfirm(false);
        let mut engine = RestoreEngine::new(&mut store, &confirm);
        let outcome = engine.restore(&result);

        assert_eq!(engine.state(), RestoreState::LeftInconsistent);
        assert_eq!(outcome.failure_count, 1);
        assert!(outcome.partial_restore);
        assert!(outcome.failure_messages[0].contains("No backup found"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "v2");
    }

    #[test]
    fn deleted_target_that_exists_again_is_left_alone() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(temp.path());
        let target = temp.path().join("back.txt");
        fs::write(&target, "recreated").unwrap();

        // The backup of the deleted bytes is not in the store.
        let result = ProcessingResult::from_records(
            vec![applied(
                OperationType::Delete,
                &target,
                Some(compute_bytes_checksum(b"deleted")),
            )],
            0,
        );
        let confirm = AutoConfirm(false);
        let outcome = RestoreEngine::new(&mut store, &confirm).restore(&result);

        assert_eq!(outcome.state, RestoreState::Completed);
        assert_eq!(outcome.success_count, 1);
        assert_eq!(fs::read_to_string(&target).unwrap(), "recreated");
        assert!(store.is_empty());
    }

    #[test]
    fn left_inconsistent_keeps_captures() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(&temp.path().join("old"));
        let added = temp.path().join("added.txt");
        let replaced = temp.path().join("replaced.txt");
        fs::write(&added, "new").unwrap();
        fs::write(&replaced, "v2").unwrap();

        // Undone last to first: the Add succeeds, then the Replace has no backup.
        let result = ProcessingResult::from_records(
            vec![
                applied(
                    OperationType::Replace,
                    &replaced,
                    Some(compute_bytes_checksum(b"v1")),
                ),
                applied(OperationType::Add, &added, None),
            ],
            0,
        );
        let confirm = AutoConfirm(false);
        let outcome = RestoreEngine::new(&mut store, &confirm).restore(&result);

        assert_eq!(outcome.state, RestoreState::LeftInconsistent);
        assert_eq!(outcome.success_count, 1);
        assert!(!added.exists());
        assert!(store.contains(&compute_bytes_checksum(b"new")));
    }

    #[test]
    fn empty_result_completes() {
        let temp = tempfile::tempdir().unwrap();
        let mut store = BackupStore::open(temp.path());
        let confirm = AutoConfirm(false);
        let outcome =
            RestoreEngine::new(&mut store, &confirm).restore(&ProcessingResult::from_records(Vec::new(), 0));
        assert_eq!(outcome.state, RestoreState::Completed);
        assert_eq!(outcome.rollback_count, 0);
    }
}
