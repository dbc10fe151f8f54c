//! `lockbox set-key` — store a key received from someone else.

use crate::cli::output;
use crate::cli::{load_registry, resolve_context, Cli};
use crate::crypto::VaultKey;
use crate::errors::Result;

/// Execute the `set-key` command.
pub fn execute(cli: &Cli, key: &str, force: bool) -> Result<()> {
    let key = VaultKey::decode(key)?;

    let mut registry = load_registry(cli)?;
    let mut ctx = resolve_context(&mut registry)?;
    ctx.set_key(&mut registry, key, force)?;

    output::success(&format!("Key saved to {}", registry.path().display()));
    Ok(())
}
