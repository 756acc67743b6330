//! Cascading per-directory match rules
//!
//! Each directory may carry one rule file. A rule applies to the files of
//! its own directory and, when `inheritToSubfolders` is set, flows down to
//! subfolders until one of them defines its own rule.

mod resolver;
mod rule;

pub use resolver::{RULE_FILE_NAMES, Resolution, RuleOrigin, RuleResolver};
pub use rule::MatchRule;
