//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod gitignore;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Registry;
use crate::context::VaultContext;
use crate::errors::{Failure, Result};
use crate::vault::Vault;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "LOCKBOX_LOG";

/// Lockbox CLI: encrypted secret files next to your source code.
#[derive(Parser)]
#[command(
    name = "lockbox",
    about = "Keep secret files encrypted inside your project",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key registry file (default: ~/.lockbox.toml)
    #[arg(long, global = true, env = "LOCKBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not add tracked files to .gitignore
    #[arg(long, global = true)]
    pub no_update_gitignore: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a vault in the current directory
    Init,

    /// Store a key for the vault (e.g. one shared by a teammate)
    SetKey {
        /// The key, as printed by `reveal-key`
        key: String,
        /// Overwrite an existing key
        #[arg(short, long)]
        force: bool,
    },

    /// Print the vault key
    RevealKey,

    /// Forget the vault key
    DeleteKey {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Track files, directories or glob patterns
    Add {
        /// Files, directories or quoted glob patterns
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Re-add files that are already tracked
        #[arg(short, long)]
        force: bool,
    },

    /// Stop tracking files or patterns
    Rm {
        /// Files or glob patterns
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show which tracked files changed
    Status,

    /// Store the current contents of changed files
    Commit,

    /// Restore tracked files from the vault
    Open {
        /// Overwrite files that changed since the last commit
        #[arg(short, long)]
        force: bool,
    },

    /// Delete tracked files from the working tree
    Close {
        /// Delete files even if they changed since the last commit
        #[arg(short, long)]
        force: bool,
    },

    /// List tracked files
    Ls,

    /// List registered glob patterns
    Globs,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the stderr log subscriber.
///
/// `LOCKBOX_LOG` wins when set; otherwise warnings only, or debug with `-v`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "lockbox=debug" } else { "lockbox=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load the key registry named by the CLI arguments.
pub fn load_registry(cli: &Cli) -> Result<Registry> {
    let path = Registry::locate(cli.config.as_deref())?;
    Registry::load(&path)
}

/// Resolve the vault containing the current directory.
pub fn resolve_context(registry: &mut Registry) -> Result<VaultContext> {
    VaultContext::resolve(Path::new("."), registry)
}

/// Resolve the current vault and load its manifest.
pub fn open_vault(cli: &Cli) -> Result<(Registry, Vault)> {
    let mut registry = load_registry(cli)?;
    let ctx = resolve_context(&mut registry)?;
    let vault = Vault::load(ctx)?;
    Ok((registry, vault))
}

/// Print every per-file failure of a batch operation.
pub fn print_failures(failures: &[Failure]) {
    for failure in failures {
        output::error(&failure.to_string());
    }
}
