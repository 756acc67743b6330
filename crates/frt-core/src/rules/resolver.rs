//! Per-directory rule lookup with inheritance

use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::MatchRule;
use crate::{Error, Result};

/// Rule file names, highest priority first. Only the first one present in a
/// directory is read.
pub const RULE_FILE_NAMES: [&str; 4] = [
    "matching-rules.json",
    "replace.json",
    "add.json",
    "delete.json",
];

/// Where a directory's effective rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    /// The directory defines its own rule
    Local,
    /// Carried down from an ancestor with `inheritToSubfolders`
    Inherited,
    /// No rule applies
    None,
}

/// Result of resolving one directory
#[derive(Debug)]
pub struct Resolution {
    rule: Option<Rc<MatchRule>>,
    pub origin: RuleOrigin,
    /// A rule file that was present but unusable
    pub problem: Option<Error>,
}

impl Resolution {
    /// Rule governing the directory itself and its files.
    pub fn effective(&self) -> Option<&Rc<MatchRule>> {
        self.rule.as_ref()
    }

    /// Rule handed to subfolders as their parent rule.
    pub fn for_children(&self) -> Option<Rc<MatchRule>> {
        self.rule.clone()
    }
}

/// Resolves the effective rule of each directory during a traversal
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleResolver;

impl RuleResolver {
    pub fn new() -> Self {
        Self
    }

    /// Find the rule file a directory carries, if any.
    pub fn rule_file(dir: &Path) -> Option<std::path::PathBuf> {
        RULE_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Whether `name` is one of the rule file names.
    pub fn is_rule_file(name: &str) -> bool {
        RULE_FILE_NAMES.contains(&name)
    }

    /// Load the local rule of `dir`.
    ///
    /// Returns `Ok(None)` when the directory has no rule file.
    pub fn load_local(&self, dir: &Path) -> Result<Option<MatchRule>> {
        let Some(path) = Self::rule_file(dir) else {
            return Ok(None);
        };
        let content = fs::read_to_string(&path).map_err(|e| Error::RuleParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        MatchRule::from_json(&content, &path).map(Some)
    }

    /// Resolve the rule for `dir` given the rule its parent carries.
    ///
    /// A local rule always wins. Without one, the parent's rule applies only
    /// if it inherits. A rule file that fails to load is reported in
    /// [`Resolution::problem`] and treated as absent.
    pub fn resolve(&self, dir: &Path, parent: Option<&Rc<MatchRule>>) -> Resolution {
        let problem = match self.load_local(dir) {
            Ok(Some(rule)) => {
                tracing::debug!(dir = %dir.display(), rule = %rule.origin.display(), "local rule");
                return Resolution {
                    rule: Some(Rc::new(rule)),
                    origin: RuleOrigin::Local,
                    problem: None,
                };
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "ignoring unusable rule file");
                Some(e)
            }
        };

        match parent.filter(|rule| rule.inherit_to_subfolders) {
            Some(rule) => {
                tracing::debug!(dir = %dir.display(), rule = %rule.origin.display(), "inherited rule");
                Resolution {
                    rule: Some(Rc::clone(rule)),
                    origin: RuleOrigin::Inherited,
                    problem,
                }
            }
            None => Resolution {
                rule: None,
                origin: RuleOrigin::None,
                problem,
            },
        }
    }
}
