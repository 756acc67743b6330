//! Confirmation callback handed in by the caller
//!
//! The core never talks to a terminal. Every decision a human may need to
//! make is phrased as a [`Prompt`] and answered by a [`Confirm`]
//! implementation: a dialog in the CLI, a fixed answer in batch mode, or a
//! closure in tests.

use std::fmt;
use std::path::Path;

use crate::record::OperationType;

/// A question the core needs answered
#[derive(Debug, Clone, Copy)]
pub enum Prompt<'a> {
    /// Plan an operation produced by a rule with `confirmBeforeApply`
    Apply {
        operation: OperationType,
        source: &'a Path,
        target: &'a Path,
    },
    /// An undo step failed; try it again?
    RetryUndo {
        operation: OperationType,
        target: &'a Path,
        error: &'a str,
    },
    /// A restore stopped part-way; revert the undos already done?
    Rollback { completed: usize, error: &'a str },
}

impl fmt::Display for Prompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Apply {
                operation,
                source,
                target,
            } => write!(
                f,
                "{} {} -> {}?",
                operation,
                source.display(),
                target.display()
            ),
            Prompt::RetryUndo {
                operation,
                target,
                error,
            } => write!(
                f,
                "Undo of {} on {} failed: {}. Retry?",
                operation,
                target.display(),
                error
            ),
            Prompt::Rollback { completed, error } => write!(
                f,
                "Restore stopped: {}. Roll back the {} step(s) already restored?",
                error, completed
            ),
        }
    }
}

/// Answers prompts raised by planning and restore
pub trait Confirm {
    fn confirm(&self, prompt: &Prompt<'_>) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&Prompt<'_>) -> bool,
{
    fn confirm(&self, prompt: &Prompt<'_>) -> bool {
        self(prompt)
    }
}

/// Gives the same answer to every prompt
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, prompt: &Prompt<'_>) -> bool {
        tracing::debug!(%prompt, answer = self.0, "auto-confirm");
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_confirm() {
        let only_rollback = |p: &Prompt<'_>| matches!(p, Prompt::Rollback { .. });
        let retry = Prompt::RetryUndo {
            operation: OperationType::Add,
            target: Path::new("t/a"),
            error: "gone",
        };
        assert!(!only_rollback.confirm(&retry));
        assert!(only_rollback.confirm(&Prompt::Rollback {
            completed: 1,
            error: "gone"
        }));
    }

    #[test]
    fn prompt_text_names_the_target() {
        let prompt = Prompt::Apply {
            operation: OperationType::Replace,
            source: Path::new("update/a.txt"),
            target: Path::new("target/a.txt"),
        };
        assert_eq!(prompt.to_string(), "Replace update/a.txt -> target/a.txt?");
    }
}
