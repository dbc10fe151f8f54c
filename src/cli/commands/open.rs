//! `lockbox open` — restore tracked files from the vault.

use crate::cli::output;
use crate::cli::{open_vault, print_failures, Cli};
use crate::errors::Result;
use crate::vault::BatchReport;

/// Execute the `open` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let (_registry, vault) = open_vault(cli)?;
    if vault.is_empty() {
        output::info("vault is empty");
        return Ok(());
    }

    let report = vault.open(force)?;
    let ctx = vault.context();

    for rel in &report.opened {
        output::success(&format!("Opened {}", ctx.rel_to_working(&ctx.project_abs(rel))));
    }
    for rel in &report.skipped {
        output::warning(&format!(
            "{} has changed - use --force to overwrite it",
            ctx.rel_to_working(&ctx.project_abs(rel))
        ));
    }

    print_failures(&report.failures);
    report.into_result()?;
    Ok(())
}
