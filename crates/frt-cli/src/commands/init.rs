//! Init command: write a default workspace

use std::fs;
use std::path::Path;

use colored::Colorize;

use frt_core::WorkspaceConfig;

use crate::error::{CliError, Result};

/// Run the init command
///
/// Writes the default layout to `path` and creates the staging, target and
/// delete directories next to it. The backup directory appears on first use.
pub fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CliError::user(format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        )));
    }

    let config = WorkspaceConfig::default();
    config.save(path)?;

    let base = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let layout = config.resolved_against(base);
    for dir in [&layout.staging_dir, &layout.target_dir, &layout.delete_dir] {
        fs::create_dir_all(dir)?;
    }

    println!("{} Wrote {}", "OK".green().bold(), path.display().to_string().cyan());
    Ok(())
}
