//! Path-paired file planning

use super::{OperationStrategy, StrategyType};
use crate::context::OperationContext;
use crate::record::{OperationRecord, OperationType};
use crate::rules::MatchRule;
use crate::tree::FileNode;

/// Pairs each governed source file with the target at the same relative path
///
/// Target absent: `Add`. Target present: `Replace`, or `Delete` when the run
/// does not replace. Identical content is skipped as unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileNameStrategy;

impl OperationStrategy for FileNameStrategy {
    fn plan_file(&self, node: &FileNode, rule: &MatchRule, ctx: &mut OperationContext<'_>) {
        if !rule.matches(node.name()) {
            return;
        }
        let source = node.path();
        let target = ctx.target_for(node.relative());

        if !target.exists() {
            if !ctx.allows(OperationType::Add) {
                ctx.skip(node.relative(), "target absent");
                return;
            }
            match ctx.digest(source) {
                Ok(sign) => {
                    let record = OperationRecord::planned(
                        StrategyType::FileName,
                        OperationType::Add,
                        source,
                        target,
                    )
                    .with_signs(Some(sign), None);
                    ctx.propose(record, rule);
                }
                Err(e) => ctx.skip(node.relative(), e.to_string()),
            }
            return;
        }

        if !target.is_file() {
            ctx.skip(node.relative(), "target is not a file");
            return;
        }

        let target_sign = match ctx.digest(&target) {
            Ok(sign) => sign,
            Err(e) => {
                ctx.skip(node.relative(), e.to_string());
                return;
            }
        };

        if ctx.allows(OperationType::Replace) {
            let source_sign = match ctx.digest(source) {
                Ok(sign) => sign,
                Err(e) => {
                    ctx.skip(node.relative(), e.to_string());
                    return;
                }
            };
            if source_sign == target_sign {
                ctx.skip(node.relative(), "unchanged");
                return;
            }
            let record = OperationRecord::planned(
                StrategyType::FileName,
                OperationType::Replace,
                source,
                target,
            )
            .with_signs(Some(source_sign), Some(target_sign));
            ctx.propose(record, rule);
        } else if ctx.allows(OperationType::Delete) {
            let record = OperationRecord::planned(
                StrategyType::FileName,
                OperationType::Delete,
                source,
                target,
            )
            .with_signs(None, Some(target_sign));
            ctx.propose(record, rule);
        } else {
            ctx.skip(node.relative(), "target present");
        }
    }
}
