//! `lockbox reveal-key` — print the vault key.

use crate::cli::{load_registry, resolve_context, Cli};
use crate::errors::Result;

/// Execute the `reveal-key` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut registry = load_registry(cli)?;
    let ctx = resolve_context(&mut registry)?;

    println!("{}", ctx.key()?.encode());
    Ok(())
}
