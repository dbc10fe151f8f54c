//! `lockbox globs` — list registered glob patterns, one per line.

use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `globs` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_registry, vault) = open_vault(cli)?;
    for pattern in vault.patterns() {
        println!("{pattern}");
    }
    Ok(())
}
