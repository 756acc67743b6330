//! Terminal answers to core prompts
//!
//! Uses dialoguer for interactive confirmation.

use dialoguer::Confirm as Dialog;
use frt_core::{Confirm, Prompt};

/// Asks the user on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogConfirm;

impl Confirm for DialogConfirm {
    fn confirm(&self, prompt: &Prompt<'_>) -> bool {
        let default = !matches!(prompt, Prompt::RetryUndo { .. });
        match Dialog::new()
            .with_prompt(prompt.to_string())
            .default(default)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(%prompt, error = %e, "prompt failed, answering no");
                false
            }
        }
    }
}

/// Answers for `--yes` runs.
///
/// Applies everything and rolls back on failure, but never retries an undo:
/// a retry with no one to fix the cause would loop forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchConfirm;

impl Confirm for BatchConfirm {
    fn confirm(&self, prompt: &Prompt<'_>) -> bool {
        let answer = !matches!(prompt, Prompt::RetryUndo { .. });
        tracing::debug!(%prompt, answer, "batch answer");
        answer
    }
}

/// Picks the prompt implementation for a command.
pub fn confirmer(batch: bool) -> Box<dyn Confirm> {
    if batch {
        Box::new(BatchConfirm)
    } else {
        Box::new(DialogConfirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frt_core::OperationType;
    use std::path::Path;

    #[test]
    fn batch_never_retries() {
        let retry = Prompt::RetryUndo {
            operation: OperationType::Replace,
            target: Path::new("target/a.txt"),
            error: "locked",
        };
        assert!(!BatchConfirm.confirm(&retry));
    }

    #[test]
    fn batch_applies_and_rolls_back() {
        let apply = Prompt::Apply {
            operation: OperationType::Add,
            source: Path::new("update/a.txt"),
            target: Path::new("target/a.txt"),
        };
        let rollback = Prompt::Rollback {
            completed: 2,
            error: "missing backup",
        };
        assert!(BatchConfirm.confirm(&apply));
        assert!(BatchConfirm.confirm(&rollback));
    }
}
