//! Depth-first planning over a snapshot tree

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::confirm::Confirm;
use crate::context::OperationContext;
use crate::record::{OperationRecord, OperationType};
use crate::rules::RuleResolver;
use crate::strategy::UnitInspector;
use crate::tree::{FileTree, NodeKind};

/// A node that produced no operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skip {
    pub path: String,
    pub reason: String,
}

/// One entry of the traversal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// Slash-relative path; empty for the root
    pub path: String,
    pub kind: NodeKind,
}

/// The output of planning, the only input of apply
#[derive(Debug, Clone)]
pub struct Plan {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub allowed: Vec<OperationType>,
    pub records: Vec<OperationRecord>,
    pub skips: Vec<Skip>,
    pub visited: Vec<Visit>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of planned records of each operation type.
    pub fn count(&self, operation: OperationType) -> usize {
        self.records
            .iter()
            .filter(|r| r.operation_type == operation)
            .count()
    }
}

/// Drives rule resolution and strategies over a tree without touching it
#[derive(Debug, Default, Clone, Copy)]
pub struct Planner {
    resolver: RuleResolver,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the tree under `source_root` against `target_root`.
    ///
    /// # Errors
    ///
    /// Fails only when `source_root` is not a directory. Everything that
    /// goes wrong below the root is recorded as a skip.
    pub fn plan(
        &self,
        source_root: &Path,
        target_root: &Path,
        allowed: &[OperationType],
        confirm: &dyn Confirm,
        inspector: &dyn UnitInspector,
    ) -> Result<Plan> {
        let tree = FileTree::build(source_root)?;
        let mut ctx = OperationContext::new(source_root, target_root, allowed, confirm, inspector);
        for problem in &tree.problems {
            ctx.skip(problem.relative.clone(), problem.reason.clone());
        }

        tree.root.process(&self.resolver, None, &mut ctx);

        let plan = ctx.into_plan();
        tracing::info!(
            source = %source_root.display(),
            records = plan.records.len(),
            skips = plan.skips.len(),
            nodes = plan.visited.len(),
            "plan complete"
        );
        Ok(plan)
    }
}
