//! Key registry — where vault keys and project locations live.
//!
//! Keys never sit inside the project.  They are kept in a per-user
//! registry keyed by vault id, reached through the `KeyStore` trait so
//! resolution code can be handed any backend:
//!
//! - `Registry`: the TOML file in the user's home directory (`registry`)
//! - `MemoryKeyStore`: an in-process map for tests and embedders (`memory`)

pub mod memory;
pub mod registry;

use std::path::{Path, PathBuf};

use crate::errors::Result;

pub use memory::MemoryKeyStore;
pub use registry::Registry;

/// Storage for vault keys and the project path each vault was last seen at.
///
/// Setters persist their change before returning.
pub trait KeyStore {
    /// Raw key bytes for a vault, `None` if no key is recorded.
    ///
    /// The length is not checked here; callers validate it.
    fn get_key(&self, vault_id: &str) -> Result<Option<Vec<u8>>>;

    /// Record a key, or remove it with `None`.
    fn set_key(&mut self, vault_id: &str, key: Option<&[u8]>) -> Result<()>;

    /// The project path recorded for a vault.
    fn project_path(&self, vault_id: &str) -> Option<PathBuf>;

    fn set_project_path(&mut self, vault_id: &str, path: &Path) -> Result<()>;
}
