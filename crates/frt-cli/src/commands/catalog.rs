//! Catalog commands: list, restore and remove-entry

use colored::Colorize;
use serde_json::json;

use frt_core::{RestoreState, SyncService, WorkspaceConfig};

use crate::error::{CliError, Result};
use crate::prompt::{BatchConfirm, confirmer};

/// Run the list command
pub fn run_list(config: WorkspaceConfig, json: bool) -> Result<()> {
    let service = SyncService::new(config, Box::new(BatchConfirm));
    let listing = service.list_entries()?;

    if json {
        let entries: Vec<_> = listing
            .entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "resultTime": e.result.result_time,
                    "successCount": e.result.success_count,
                    "errorCount": e.result.error_count,
                    "skipCount": e.result.skip_count,
                })
            })
            .collect();
        let failures: Vec<_> = listing
            .failures
            .iter()
            .map(|f| json!({ "name": f.name, "message": f.message }))
            .collect();
        let value = json!({ "entries": entries, "failures": failures });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if listing.entries.is_empty() && listing.failures.is_empty() {
        println!("No recorded runs.");
        return Ok(());
    }
    for entry in &listing.entries {
        let status = if entry.result.success {
            "ok".green()
        } else {
            "partial".yellow()
        };
        println!(
            "{}  {}  {} ops, {} failed  [{}]",
            entry.name.cyan(),
            entry.result.result_time.format("%Y-%m-%d %H:%M:%S"),
            entry.result.operation_records.len(),
            entry.result.error_count,
            status
        );
    }
    for failure in &listing.failures {
        println!(
            "{}  {}: {}",
            failure.name.red(),
            "unreadable".red().bold(),
            failure.message
        );
    }
    Ok(())
}

/// Run the restore command
pub fn run_restore(config: WorkspaceConfig, entry: &str, yes: bool) -> Result<()> {
    let mut service = SyncService::new(config, confirmer(yes));
    println!("{} Restoring {}...", "=>".blue().bold(), entry.cyan());
    let outcome = service.restore_entry(entry)?;

    for message in &outcome.failure_messages {
        println!("   {} {}", "FAILED".red().bold(), message);
    }
    match outcome.state {
        RestoreState::Completed => {
            println!(
                "{} Restored {} operation(s).",
                "OK".green().bold(),
                outcome.success_count
            );
            Ok(())
        }
        RestoreState::RolledBack => Err(CliError::user(format!(
            "restore of {} failed and was rolled back ({} step(s) reverted)",
            entry, outcome.rollback_count
        ))),
        state => Err(CliError::user(format!(
            "restore of {} stopped in state {:?}; {} of {} step(s) restored",
            entry,
            state,
            outcome.success_count,
            outcome.success_count + outcome.failure_count
        ))),
    }
}

/// Run the remove-entry command
pub fn run_remove_entry(config: WorkspaceConfig, entry: &str) -> Result<()> {
    let mut service = SyncService::new(config, Box::new(BatchConfirm));
    let removal = service.delete_catalog_entry(entry)?;
    println!(
        "{} Removed {} ({} backup(s) deleted, {} still referenced)",
        "OK".green().bold(),
        removal.name.cyan(),
        removal.removed.len(),
        removal.retained.len()
    );
    Ok(())
}
