//! Apply phase: the only code that mutates the target tree

use frt_fs::io::{copy_file, remove_file};

use crate::backup::BackupStore;
use crate::record::{OperationRecord, OperationType};
use crate::{Error, Result};

/// Applies planned records, backing up whatever it overwrites or deletes
pub struct Executor<'a> {
    store: &'a mut BackupStore,
}

impl<'a> Executor<'a> {
    pub fn new(store: &'a mut BackupStore) -> Self {
        Self { store }
    }

    /// Apply every record in order, continuing past failures.
    ///
    /// Each record ends up either succeeded, with digests taken from the
    /// bytes actually copied, or failed with its error message.
    pub fn apply_all(&mut self, records: &mut [OperationRecord]) {
        for record in records.iter_mut() {
            match self.apply(record) {
                Ok(()) => {
                    record.succeed();
                    tracing::info!(
                        operation = %record.operation_type,
                        target = %record.target_path.display(),
                        "applied"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        operation = %record.operation_type,
                        target = %record.target_path.display(),
                        error = %e,
                        "operation failed"
                    );
                    record.fail(e.to_string());
                }
            }
        }
    }

    fn apply(&mut self, record: &mut OperationRecord) -> Result<()> {
        let source = record.source_path.clone();
        let target = record.target_path.clone();

        match record.operation_type {
            OperationType::Add => {
                require_file(&source, "source is missing")?;
                if target.exists() {
                    return Err(precondition(&target, "target already exists"));
                }
                let source_sign = self.store.digest(&source)?;
                copy_file(&source, &target)?;
                let target_sign = match self.store.digest(&target) {
                    Ok(sign) => sign,
                    Err(e) => {
                        discard_partial(&target);
                        return Err(e);
                    }
                };
                record.source_file_sign = Some(source_sign);
                record.target_file_sign = Some(target_sign);
            }
            OperationType::Replace => {
                require_file(&source, "source is missing")?;
                require_file(&target, "target is missing")?;
                let previous = self.store.add(&target)?;
                record.target_file_sign = Some(previous);
                copy_file(&source, &target)?;
                record.source_file_sign = Some(self.store.digest(&source)?);
            }
            OperationType::Delete => {
                require_file(&target, "target is missing")?;
                let previous = self.store.add(&target)?;
                record.target_file_sign = Some(previous);
                remove_file(&target)?;
            }
        }
        Ok(())
    }
}

/// Remove the copy a failed Add left behind; a failed record is never undone.
fn discard_partial(target: &std::path::Path) {
    if target.exists()
        && let Err(e) = remove_file(target)
    {
        tracing::warn!(target = %target.display(), error = %e, "failed to remove partial add");
    }
}

fn require_file(path: &std::path::Path, message: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(precondition(path, message))
    }
}

fn precondition(path: &std::path::Path, message: &str) -> Error {
    Error::Precondition {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyType;
    use frt_fs::compute_bytes_checksum;
    use std::fs;
    use std::path::Path;

    fn record(op: OperationType, source: &Path, target: &Path) -> OperationRecord {
        OperationRecord::planned(StrategyType::FileName, op, source, target)
    }

    #[test]
    fn replace_backs_up_previous_content() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("u/a.jar");
        let target = temp.path().join("t/a.jar");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&source, "v2").unwrap();
        fs::write(&target, "v1").unwrap();

        let mut store = BackupStore::open(&temp.path().join("old"));
        let mut records = vec![record(OperationType::Replace, &source, &target)];
        Executor::new(&mut store).apply_all(&mut records);

        let applied = &records[0];
        assert!(applied.success, "{:?}", applied.error_message);
        assert_eq!(fs::read_to_string(&target).unwrap(), "v2");
        assert_eq!(applied.target_file_sign.as_deref(), Some(compute_bytes_checksum(b"v1").as_str()));
        assert_eq!(applied.source_file_sign.as_deref(), Some(compute_bytes_checksum(b"v2").as_str()));
        assert!(store.contains(&compute_bytes_checksum(b"v1")));
    }

    #[test]
    fn add_refuses_existing_target() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a");
        let target = temp.path().join("b");
        fs::write(&source, "new").unwrap();
        fs::write(&target, "old").unwrap();

        let mut store = BackupStore::open(&temp.path().join("old"));
        let mut records = vec![record(OperationType::Add, &source, &target)];
        Executor::new(&mut store).apply_all(&mut records);

        assert!(!records[0].success);
        assert!(records[0].error_message.as_deref().unwrap().contains("already exists"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    }

    #[test]
    fn delete_keeps_a_backup() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("t/gone.txt");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "last words").unwrap();

        let mut store = BackupStore::open(&temp.path().join("old"));
        let mut records = vec![record(OperationType::Delete, &target, &target)];
        Executor::new(&mut store).apply_all(&mut records);

        assert!(records[0].success);
        assert!(!target.exists());
        let sign = records[0].target_file_sign.clone().unwrap();
        assert_eq!(fs::read_to_string(store.lookup(&sign).unwrap()).unwrap(), "last words");
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        let present = temp.path().join("present");
        fs::write(&present, "p").unwrap();

        let mut store = BackupStore::open(&temp.path().join("old"));
        let mut records = vec![
            record(OperationType::Add, &temp.path().join("vanished"), &temp.path().join("x")),
            record(OperationType::Add, &present, &temp.path().join("out/present")),
        ];
        Executor::new(&mut store).apply_all(&mut records);

        assert!(!records[0].success);
        assert!(records[1].success);
        assert!(!temp.path().join("x").exists());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_add_source_leaves_no_target() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("sealed");
        let target = temp.path().join("t/sealed");
        fs::write(&source, "secret").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::File::open(&source).is_ok() {
            // Privileged users read through the mode bits.
            return;
        }

        let mut store = BackupStore::open(&temp.path().join("old"));
        let mut records = vec![record(OperationType::Add, &source, &target)];
        Executor::new(&mut store).apply_all(&mut records);

        assert!(!records[0].success);
        assert!(records[0].target_file_sign.is_none());
        assert!(!target.exists());
    }

    #[test]
    fn partial_add_is_discarded() {
        let temp = tempfile::tempdir().unwrap();
        let copied = temp.path().join("copied");
        fs::write(&copied, "half").unwrap();

        discard_partial(&copied);
        assert!(!copied.exists());
        discard_partial(&copied);
    }
}
