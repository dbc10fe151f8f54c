//! `lockbox rm` — stop tracking files and patterns.

use std::path::PathBuf;

use crate::cli::output;
use crate::cli::{open_vault, print_failures, Cli};
use crate::errors::Result;
use crate::vault::BatchReport;

/// Execute the `rm` command.
pub fn execute(cli: &Cli, paths: &[PathBuf]) -> Result<()> {
    let (_registry, mut vault) = open_vault(cli)?;
    let report = vault.remove(paths)?;
    let ctx = vault.context();

    for pattern in &report.patterns_removed {
        output::info(&format!("No longer tracking pattern {pattern}"));
    }
    for rel in &report.files_removed {
        output::success(&format!("Removed {}", ctx.rel_to_working(&ctx.project_abs(rel))));
    }
    for input in &report.unmatched {
        output::warning(&format!("{input} did not match any tracked file"));
    }

    print_failures(&report.failures);
    report.into_result()?;
    Ok(())
}
