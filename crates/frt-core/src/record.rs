//! Operation records and run results
//!
//! An [`OperationRecord`] is born during planning with provisional paths and
//! digests, finalized by the executor, and frozen once its
//! [`ProcessingResult`] is written to the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::strategy::StrategyType;

/// The kind of mutation an operation performs on the target tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationType {
    /// Copy a staging file to a target path that does not exist yet
    Add,
    /// Overwrite an existing target file with staging content
    Replace,
    /// Remove an existing target file
    Delete,
}

impl OperationType {
    /// Every operation type, in display order.
    pub const ALL: [OperationType; 3] = [Self::Add, Self::Replace, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Replace => "Replace",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned (and later applied) file operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Strategy that proposed the operation
    pub strategy_type: StrategyType,
    /// What the operation does to the target
    pub operation_type: OperationType,
    /// Staging (or delete-tree) file the operation was derived from
    pub source_path: PathBuf,
    /// Target file the operation mutates
    pub target_path: PathBuf,
    /// Digest of the source content at apply time
    #[serde(default)]
    pub source_file_sign: Option<String>,
    /// Digest of the target content before mutation (after copy for `Add`)
    #[serde(default)]
    pub target_file_sign: Option<String>,
    /// Planning time, overwritten with the apply time by the executor
    pub timestamp: DateTime<Utc>,
    /// Whether the executor applied the operation
    #[serde(default)]
    pub success: bool,
    /// Reason the operation failed, if it did
    #[serde(default)]
    pub error_message: Option<String>,
}

impl OperationRecord {
    /// Create a planned record with provisional digests.
    pub fn planned(
        strategy_type: StrategyType,
        operation_type: OperationType,
        source_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            strategy_type,
            operation_type,
            source_path: source_path.into(),
            target_path: target_path.into(),
            source_file_sign: None,
            target_file_sign: None,
            timestamp: Utc::now(),
            success: false,
            error_message: None,
        }
    }

    /// Attach provisional digests computed during planning.
    pub fn with_signs(mut self, source: Option<String>, target: Option<String>) -> Self {
        self.source_file_sign = source;
        self.target_file_sign = target;
        self
    }

    /// Mark the record as applied.
    pub fn succeed(&mut self) {
        self.success = true;
        self.error_message = None;
        self.timestamp = Utc::now();
    }

    /// Mark the record as failed with `message`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = Some(message.into());
        self.timestamp = Utc::now();
    }

    /// Every digest this record references.
    pub fn signs(&self) -> impl Iterator<Item = &str> {
        self.source_file_sign
            .as_deref()
            .into_iter()
            .chain(self.target_file_sign.as_deref())
    }
}

/// The outcome of applying one plan, persisted as a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub result_time: DateTime<Utc>,
    pub success_count: usize,
    pub skip_count: usize,
    pub error_count: usize,
    /// `true` when no record failed
    pub success: bool,
    #[serde(default)]
    pub operation_records: Vec<OperationRecord>,
}

impl ProcessingResult {
    /// Build a result from applied records and the plan's skip count.
    ///
    /// Counts are derived from the records so they always agree with them.
    pub fn from_records(operation_records: Vec<OperationRecord>, skip_count: usize) -> Self {
        let success_count = operation_records.iter().filter(|r| r.success).count();
        let error_count = operation_records.len() - success_count;
        Self {
            result_time: Utc::now(),
            success_count,
            skip_count,
            error_count,
            success: error_count == 0,
            operation_records,
        }
    }

    /// Whether the stored tallies agree with the records.
    pub fn tallies_match(&self) -> bool {
        let successes = self.operation_records.iter().filter(|r| r.success).count();
        successes == self.success_count
            && self.operation_records.len() - successes == self.error_count
            && self.success == (self.error_count == 0)
    }

    /// Every backup-store digest referenced by this result.
    pub fn referenced_signs(&self) -> BTreeSet<String> {
        self.operation_records
            .iter()
            .flat_map(OperationRecord::signs)
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.operation_records.is_empty()
    }
}
