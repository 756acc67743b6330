//! Plan, update and delete commands
//!
//! Planning never writes. Update and delete show the plan, ask once, apply
//! it and record the run in the catalog.

use colored::Colorize;
use dialoguer::Confirm as Dialog;
use serde_json::json;

use frt_core::{OperationType, Plan, ProcessingResult, SyncService, WorkspaceConfig};

use crate::error::{CliError, Result};
use crate::prompt::{BatchConfirm, confirmer};

/// Run the plan command
pub fn run_plan(config: WorkspaceConfig, delete: bool, prune: bool, json: bool) -> Result<()> {
    // Rule-level confirmations are answered yes so the preview is complete.
    let service = SyncService::new(config, Box::new(BatchConfirm));
    let plan = if delete {
        service.plan_delete()?
    } else {
        service.plan_update(prune)?
    };

    if json {
        let value = json!({
            "sourceRoot": plan.source_root,
            "targetRoot": plan.target_root,
            "records": plan.records,
            "skips": plan.skips,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Run the update command
pub fn run_update(config: WorkspaceConfig, prune: bool, yes: bool) -> Result<()> {
    let mut service = SyncService::new(config, confirmer(yes));
    println!(
        "{} Planning {}...",
        "=>".blue().bold(),
        service.config().staging_dir.display()
    );
    let plan = service.plan_update(prune)?;
    apply_and_record(&mut service, plan, yes)
}

/// Run the delete command
pub fn run_delete(config: WorkspaceConfig, yes: bool) -> Result<()> {
    let mut service = SyncService::new(config, confirmer(yes));
    println!(
        "{} Planning {}...",
        "=>".blue().bold(),
        service.config().delete_dir.display()
    );
    let plan = service.plan_delete()?;
    apply_and_record(&mut service, plan, yes)
}

fn apply_and_record(service: &mut SyncService, plan: Plan, yes: bool) -> Result<()> {
    print_plan(&plan);
    if plan.is_empty() {
        println!("{} Nothing to do.", "OK".green().bold());
        return Ok(());
    }

    if !yes {
        let proceed = Dialog::new()
            .with_prompt(format!("Apply {} operation(s)?", plan.records.len()))
            .default(false)
            .interact()?;
        if !proceed {
            println!("{} Aborted, nothing changed.", "=>".yellow().bold());
            return Ok(());
        }
    }

    let result = service.apply(plan);
    let entry = service.commit(&result)?;
    print_result(&result);
    println!("{} Recorded as {}", "OK".green().bold(), entry.cyan());

    if result.error_count > 0 {
        return Err(CliError::user(format!(
            "{} operation(s) failed; run `frt restore {}` to undo the rest",
            result.error_count, entry
        )));
    }
    Ok(())
}

fn print_plan(plan: &Plan) {
    println!(
        "{} {} add, {} replace, {} delete, {} skipped",
        "Plan:".bold(),
        plan.count(OperationType::Add),
        plan.count(OperationType::Replace),
        plan.count(OperationType::Delete),
        plan.skips.len()
    );
    for record in &plan.records {
        let label = match record.operation_type {
            OperationType::Add => "ADD".green(),
            OperationType::Replace => "REPLACE".yellow(),
            OperationType::Delete => "DELETE".red(),
        };
        println!("   {} {}", label.bold(), record.target_path.display());
    }
    for skip in &plan.skips {
        println!("   {} {}: {}", "SKIP".dimmed(), skip.path, skip.reason);
    }
}

fn print_result(result: &ProcessingResult) {
    println!(
        "{} {} succeeded, {} failed, {} skipped",
        "Result:".bold(),
        result.success_count,
        result.error_count,
        result.skip_count
    );
    for record in result.operation_records.iter().filter(|r| !r.success) {
        println!(
            "   {} {} {}: {}",
            "FAILED".red().bold(),
            record.operation_type,
            record.target_path.display(),
            record.error_message.as_deref().unwrap_or("unknown error")
        );
    }
}
