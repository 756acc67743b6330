//! Planning strategies
//!
//! A rule names one strategy. Strategies look at a staging node and its
//! target counterpart and append records or skips to the
//! [`OperationContext`]; they never write to disk.

mod content_unit;
mod file_name;
mod inspector;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::OperationContext;
use crate::rules::MatchRule;
use crate::tree::FileNode;

pub use content_unit::ContentUnitStrategy;
pub use file_name::FileNameStrategy;
pub use inspector::{ContentUnit, NameVersionInspector, UnitError, UnitInspector};

/// The closed set of strategies a rule can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyType {
    /// Pair staging and target files by relative path
    FileName,
    /// Pair content units inside a folder by identity
    #[serde(alias = "McMod")]
    ContentUnit,
}

impl StrategyType {
    /// Parse the `strategyType` field of a rule file.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FileName" => Some(Self::FileName),
            "ContentUnit" | "McMod" => Some(Self::ContentUnit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileName => "FileName",
            Self::ContentUnit => "ContentUnit",
        }
    }

    /// The planner implementing this strategy.
    pub fn strategy(&self) -> &'static dyn OperationStrategy {
        match self {
            Self::FileName => &FileNameStrategy,
            Self::ContentUnit => &ContentUnitStrategy,
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure planning step invoked by the tree traversal
///
/// Each strategy handles the node kind it cares about and ignores the other.
pub trait OperationStrategy {
    /// Plan a file governed by `rule`.
    fn plan_file(&self, _node: &FileNode, _rule: &MatchRule, _ctx: &mut OperationContext<'_>) {}

    /// Plan a folder, as a unit, whose effective rule is `rule`.
    fn plan_folder(&self, _node: &FileNode, _rule: &MatchRule, _ctx: &mut OperationContext<'_>) {}
}
