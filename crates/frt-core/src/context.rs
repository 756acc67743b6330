//! Per-run planning state shared with strategies

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use frt_fs::compute_file_checksum;

use crate::Result;
use crate::confirm::{Confirm, Prompt};
use crate::planner::{Plan, Skip, Visit};
use crate::record::{OperationRecord, OperationType};
use crate::rules::MatchRule;
use crate::strategy::UnitInspector;
use crate::tree::NodeKind;

/// Mutable state of one planning run
///
/// Strategies read the filesystem through this context and append records
/// or skips to it. Nothing here writes to disk.
pub struct OperationContext<'a> {
    source_root: PathBuf,
    target_root: PathBuf,
    allowed: BTreeSet<OperationType>,
    confirm: &'a dyn Confirm,
    inspector: &'a dyn UnitInspector,
    records: Vec<OperationRecord>,
    skips: Vec<Skip>,
    visited: Vec<Visit>,
}

impl<'a> OperationContext<'a> {
    pub fn new(
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        allowed: &[OperationType],
        confirm: &'a dyn Confirm,
        inspector: &'a dyn UnitInspector,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            allowed: allowed.iter().copied().collect(),
            confirm,
            inspector,
            records: Vec::new(),
            skips: Vec::new(),
            visited: Vec::new(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Target path mirroring a slash-relative source path.
    pub fn target_for(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.target_root.clone(), |path, segment| path.join(segment))
    }

    pub fn allows(&self, operation: OperationType) -> bool {
        self.allowed.contains(&operation)
    }

    /// A sync run may add content; only such runs prune target-only units.
    pub fn prunes(&self) -> bool {
        self.allows(OperationType::Add) && self.allows(OperationType::Delete)
    }

    pub fn inspector(&self) -> &dyn UnitInspector {
        self.inspector
    }

    /// Provisional digest of `path` for planning.
    pub fn digest(&self, path: &Path) -> Result<String> {
        Ok(compute_file_checksum(path)?)
    }

    /// Add `record` to the plan, asking first when `rule` demands it.
    ///
    /// Returns `false` when the record was declined and skipped instead.
    pub fn propose(&mut self, record: OperationRecord, rule: &MatchRule) -> bool {
        if rule.confirm_before_apply {
            let prompt = Prompt::Apply {
                operation: record.operation_type,
                source: &record.source_path,
                target: &record.target_path,
            };
            if !self.confirm.confirm(&prompt) {
                let path = record.target_path.display().to_string();
                self.skip(path, format!("{} declined", record.operation_type));
                return false;
            }
        }
        tracing::debug!(
            operation = %record.operation_type,
            target = %record.target_path.display(),
            "planned"
        );
        self.records.push(record);
        true
    }

    /// Record that `path` produced no operation, and why.
    pub fn skip(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        let skip = Skip {
            path: path.into(),
            reason: reason.into(),
        };
        tracing::debug!(path = %skip.path, reason = %skip.reason, "skipped");
        self.skips.push(skip);
    }

    pub fn visit(&mut self, relative: &str, kind: NodeKind) {
        self.visited.push(Visit {
            path: relative.to_string(),
            kind,
        });
    }

    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    pub fn skips(&self) -> &[Skip] {
        &self.skips
    }

    /// Finish planning and hand the accumulated state over as a [`Plan`].
    pub fn into_plan(self) -> Plan {
        Plan {
            source_root: self.source_root,
            target_root: self.target_root,
            allowed: self.allowed.into_iter().collect(),
            records: self.records,
            skips: self.skips,
            visited: self.visited,
        }
    }
}
