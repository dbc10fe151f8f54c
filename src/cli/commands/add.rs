//! `lockbox add` — track files, directories and glob patterns.

use std::path::PathBuf;

use crate::cli::gitignore::patch_gitignore;
use crate::cli::output;
use crate::cli::{open_vault, print_failures, Cli};
use crate::errors::Result;
use crate::vault::BatchReport;

/// Execute the `add` command.
pub fn execute(cli: &Cli, paths: &[PathBuf], force: bool) -> Result<()> {
    let (registry, mut vault) = open_vault(cli)?;
    let report = vault.add(paths, force)?;
    let ctx = vault.context();

    for pattern in &report.patterns_added {
        output::info(&format!("Tracking pattern {pattern}"));
    }
    for rel in &report.files_added {
        output::success(&format!("Added {}", ctx.rel_to_working(&ctx.project_abs(rel))));
    }

    if !(cli.no_update_gitignore || registry.no_update_gitignore) {
        for entry in patch_gitignore(&ctx.project_path, &report.ignore_entries) {
            output::info(&format!("Added '{entry}' to .gitignore"));
        }
    }

    print_failures(&report.failures);
    report.into_result()?;
    Ok(())
}
