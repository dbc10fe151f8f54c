//! `lockbox ls` — list tracked files, one per line.

use crate::cli::{open_vault, Cli};
use crate::errors::Result;

/// Execute the `ls` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_registry, vault) = open_vault(cli)?;
    for path in vault.ls() {
        println!("{path}");
    }
    Ok(())
}
