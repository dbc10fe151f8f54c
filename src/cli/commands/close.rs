//! `lockbox close` — delete tracked files from the working tree.

use crate::cli::output;
use crate::cli::{open_vault, print_failures, Cli};
use crate::errors::Result;
use crate::vault::BatchReport;

/// Execute the `close` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let (_registry, vault) = open_vault(cli)?;
    if vault.is_empty() {
        output::info("vault is empty");
        return Ok(());
    }

    let report = vault.close(force)?;
    let ctx = vault.context();

    for rel in &report.closed {
        output::success(&format!("Closed {}", ctx.rel_to_working(&ctx.project_abs(rel))));
    }

    print_failures(&report.failures);
    report.into_result()?;
    Ok(())
}
