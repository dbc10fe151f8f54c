//! `lockbox init` — create a vault in the current directory.

use crate::cli::output;
use crate::cli::{load_registry, Cli};
use crate::context::VaultContext;
use crate::errors::Result;
use crate::vault::format::VAULT_DIR;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut registry = load_registry(cli)?;
    let cwd = std::env::current_dir()?;

    VaultContext::init(&cwd, &mut registry)?;

    output::success(&format!(
        "Initialized empty vault in {}",
        cwd.join(VAULT_DIR).display()
    ));
    output::tip("Run `lockbox add <FILE>` to track your first secret file.");
    output::tip("Run `lockbox reveal-key` to share the key with your team.");
    Ok(())
}
