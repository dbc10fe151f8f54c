//! `lockbox commit` — store the current contents of changed files.

use crate::cli::output;
use crate::cli::{open_vault, print_failures, Cli};
use crate::errors::Result;
use crate::vault::BatchReport;

/// Execute the `commit` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_registry, mut vault) = open_vault(cli)?;
    let report = vault.commit()?;
    let ctx = vault.context();

    if report.updated.is_empty() && report.failures.is_empty() {
        output::info("no changes");
        return Ok(());
    }
    for rel in &report.updated {
        output::success(&format!("Updated {}", ctx.rel_to_working(&ctx.project_abs(rel))));
    }

    print_failures(&report.failures);
    report.into_result()?;
    Ok(())
}
