//! `lockbox status` — show which tracked files changed.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_registry, vault) = open_vault(cli)?;

    if vault.is_empty() && vault.patterns().is_empty() {
        output::info("vault is empty");
        return Ok(());
    }

    let ctx = vault.context();
    if !ctx.has_key() {
        output::warning("no key for this vault; you can see status but not open or commit");
    }

    let rows = vault.status()?;
    output::print_status_table(ctx, &rows);
    Ok(())
}
