//! `lockbox delete-key` — forget the vault key.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{load_registry, resolve_context, Cli};
use crate::errors::{LockboxError, Result};

/// Execute the `delete-key` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let mut registry = load_registry(cli)?;
    let mut ctx = resolve_context(&mut registry)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        output::warning("Without the key, files in this vault cannot be opened again.");
        let confirmed = Confirm::new()
            .with_prompt("Delete the vault key?")
            .default(false)
            .interact()
            .map_err(|e| LockboxError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    ctx.delete_key(&mut registry)?;
    output::success("Deleted the vault key");
    Ok(())
}
