//! Identity-paired content-unit planning

use std::collections::BTreeMap;
use std::path::Path;

use super::{ContentUnit, OperationStrategy, StrategyType};
use crate::context::OperationContext;
use crate::record::{OperationRecord, OperationType};
use crate::rules::MatchRule;
use crate::tree::FileNode;

/// Compares the units of a staging folder with those of its target folder
///
/// Units are paired by identity, so `lib-1.0.jar` and `lib-2.0.jar` are the
/// same unit. Staging only: `Add`. Both: `Replace` (onto the existing target
/// file), or `Delete` in a delete run. Target only: `Delete`, in pruning
/// sync runs only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentUnitStrategy;

impl OperationStrategy for ContentUnitStrategy {
    fn plan_folder(&self, node: &FileNode, rule: &MatchRule, ctx: &mut OperationContext<'_>) {
        let target_dir = ctx.target_for(node.relative());

        let Some(staged) = units_of(node.path(), node.relative(), rule, ctx) else {
            return;
        };
        let existing = if target_dir.is_dir() {
            match units_of(&target_dir, node.relative(), rule, ctx) {
                Some(units) => units,
                None => return,
            }
        } else {
            BTreeMap::new()
        };

        for (identity, unit) in &staged {
            match existing.get(identity) {
                None if ctx.allows(OperationType::Add) => {
                    let Some(name) = unit.path.file_name() else {
                        continue;
                    };
                    propose(ctx, rule, OperationType::Add, unit, &target_dir.join(name));
                }
                None => ctx.skip(display(&unit.path), "target unit absent"),
                Some(current) if ctx.allows(OperationType::Replace) => {
                    propose(ctx, rule, OperationType::Replace, unit, &current.path);
                }
                Some(current) if ctx.allows(OperationType::Delete) => {
                    propose(ctx, rule, OperationType::Delete, unit, &current.path);
                }
                Some(_) => ctx.skip(display(&unit.path), "target unit present"),
            }
        }

        if ctx.prunes() {
            for current in existing
                .iter()
                .filter(|(identity, _)| !staged.contains_key(*identity))
                .map(|(_, unit)| unit)
            {
                propose(ctx, rule, OperationType::Delete, current, &current.path);
            }
        }
    }
}

/// Inspect `dir` and key the units the rule governs by identity.
///
/// Returns `None` when the directory cannot be listed at all.
fn units_of(
    dir: &Path,
    relative: &str,
    rule: &MatchRule,
    ctx: &mut OperationContext<'_>,
) -> Option<BTreeMap<String, ContentUnit>> {
    let items = match ctx.inspector().inspect(dir) {
        Ok(items) => items,
        Err(e) => {
            ctx.skip(relative, e.to_string());
            return None;
        }
    };

    let mut units: BTreeMap<String, ContentUnit> = BTreeMap::new();
    for item in items {
        match item {
            Ok(unit) => {
                let governed = unit
                    .path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| rule.matches(name));
                if !governed {
                    continue;
                }
                if let Some(previous) = units.get(&unit.identity) {
                    tracing::warn!(
                        identity = %unit.identity,
                        kept = %unit.path.display(),
                        dropped = %previous.path.display(),
                        "duplicate content unit, last listed wins"
                    );
                }
                units.insert(unit.identity.clone(), unit);
            }
            Err(e) => ctx.skip(display(&e.path), e.reason),
        }
    }
    Some(units)
}

fn propose(
    ctx: &mut OperationContext<'_>,
    rule: &MatchRule,
    operation: OperationType,
    unit: &ContentUnit,
    target: &Path,
) {
    let source_sign = match operation {
        OperationType::Delete => None,
        _ => match ctx.digest(&unit.path) {
            Ok(sign) => Some(sign),
            Err(e) => {
                ctx.skip(display(&unit.path), e.to_string());
                return;
            }
        },
    };
    let target_sign = match operation {
        OperationType::Add => None,
        _ => match ctx.digest(target) {
            Ok(sign) => Some(sign),
            Err(e) => {
                ctx.skip(display(target), e.to_string());
                return;
            }
        },
    };
    if operation == OperationType::Replace && source_sign == target_sign {
        ctx.skip(display(target), "unchanged");
        return;
    }

    let record = OperationRecord::planned(StrategyType::ContentUnit, operation, &unit.path, target)
        .with_signs(source_sign, target_sign);
    ctx.propose(record, rule);
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
