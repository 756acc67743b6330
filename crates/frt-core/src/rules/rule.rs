//! Match rule definition and file-name matching

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::strategy::StrategyType;
use crate::{Error, Result};

/// Rule file content as written on disk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    strategy_type: String,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    exclude_patterns: Vec<String>,
    #[serde(default)]
    inherit_to_subfolders: bool,
    #[serde(default)]
    replacements: Vec<Value>,
    #[serde(default)]
    confirm_before_apply: bool,
}

/// A parsed rule with its patterns compiled
#[derive(Debug, Clone)]
pub struct MatchRule {
    pub strategy_type: StrategyType,
    pub patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub inherit_to_subfolders: bool,
    /// Opaque replacement payload, carried through for strategies
    pub replacements: Vec<Value>,
    /// Ask before planning each record this rule produces
    pub confirm_before_apply: bool,
    /// Rule file the rule was read from
    pub origin: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl MatchRule {
    /// Parse rule JSON read from `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuleParse`] for malformed JSON,
    /// [`Error::UnknownStrategy`] for an unrecognized `strategyType`, and
    /// [`Error::InvalidPattern`] when a glob does not compile.
    pub fn from_json(content: &str, origin: &Path) -> Result<Self> {
        let raw: RawRule = serde_json::from_str(content).map_err(|e| Error::RuleParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        let strategy_type =
            StrategyType::parse(&raw.strategy_type).ok_or_else(|| Error::UnknownStrategy {
                path: origin.to_path_buf(),
                strategy: raw.strategy_type.clone(),
            })?;

        let include = compile(&raw.patterns, origin)?;
        let exclude = compile(&raw.exclude_patterns, origin)?;

        Ok(Self {
            strategy_type,
            patterns: raw.patterns,
            exclude_patterns: raw.exclude_patterns,
            inherit_to_subfolders: raw.inherit_to_subfolders,
            replacements: raw.replacements,
            confirm_before_apply: raw.confirm_before_apply,
            origin: origin.to_path_buf(),
            include,
            exclude,
        })
    }

    /// Whether a file called `file_name` is governed by this rule.
    ///
    /// Exclusions win over inclusions. An empty include list matches every
    /// name.
    pub fn matches(&self, file_name: &str) -> bool {
        if self.exclude.is_match(file_name) {
            return false;
        }
        self.patterns.is_empty() || self.include.is_match(file_name)
    }
}

impl PartialEq for MatchRule {
    fn eq(&self, other: &Self) -> bool {
        self.strategy_type == other.strategy_type
            && self.patterns == other.patterns
            && self.exclude_patterns == other.exclude_patterns
            && self.inherit_to_subfolders == other.inherit_to_subfolders
            && self.replacements == other.replacements
            && self.confirm_before_apply == other.confirm_before_apply
            && self.origin == other.origin
    }
}

fn compile(patterns: &[String], origin: &Path) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::InvalidPattern {
            path: origin.to_path_buf(),
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| Error::InvalidPattern {
        path: origin.to_path_buf(),
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}
