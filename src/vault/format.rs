//! On-disk layout of a vault directory.
//!
//! ```text
//! <project>/
//! └── .lockbox/
//!     ├── config      identity record (JSON): version, vault id, patterns
//!     ├── manifest    one `<digest>\t<relative path>` line per tracked file
//!     ├── data/       sealed objects, named by their digest
//!     └── key         legacy raw key, only in vaults made before the registry
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{LockboxError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Name of the directory that marks a vault root.
pub const VAULT_DIR: &str = ".lockbox";

/// Identity record inside the vault directory.
pub const CONFIG_FILE: &str = "config";

/// Manifest inside the vault directory.
pub const MANIFEST_FILE: &str = "manifest";

/// Object store inside the vault directory.
pub const DATA_DIR: &str = "data";

/// Raw key file written by vaults that predate the key registry.
pub const LEGACY_KEY_FILE: &str = "key";

/// Current identity record version.
pub const CURRENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// VaultIdentity
// ---------------------------------------------------------------------------

/// Identity and tracking configuration of one vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultIdentity {
    /// Record version.
    pub version: u32,

    /// Globally unique vault id (UUID v4). Never changes once written.
    pub id: String,

    /// Project-relative glob patterns tracked automatically, kept sorted.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl VaultIdentity {
    /// A brand-new identity with a random id and no patterns.
    pub fn generate() -> Self {
        Self {
            version: CURRENT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            patterns: Vec::new(),
        }
    }

    /// Register a pattern. Returns `false` if it was already registered.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        match self.patterns.binary_search_by(|p| p.as_str().cmp(pattern)) {
            Ok(_) => false,
            Err(pos) => {
                self.patterns.insert(pos, pattern.to_string());
                true
            }
        }
    }

    /// Unregister a pattern. Returns `false` if it was not registered.
    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        match self.patterns.binary_search_by(|p| p.as_str().cmp(pattern)) {
            Ok(pos) => {
                self.patterns.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Parse and validate an identity record.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let mut identity: Self = serde_json::from_slice(bytes)
            .map_err(|e| LockboxError::ConfigError(format!("vault config: {e}")))?;

        if identity.version != CURRENT_VERSION {
            return Err(LockboxError::ConfigError(format!(
                "unsupported vault config version {}, expected {CURRENT_VERSION}",
                identity.version
            )));
        }
        if identity.id.is_empty() {
            return Err(LockboxError::ConfigError(
                "no vault id found in vault config".into(),
            ));
        }

        // Hand-edited files may be unsorted or contain duplicates.
        identity.patterns.sort();
        identity.patterns.dedup();
        Ok(identity)
    }

    /// Write the identity record into `vault_root`.
    pub fn write(&self, vault_root: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| LockboxError::SerializationError(format!("vault config: {e}")))?;
        write_atomic(&vault_root.join(CONFIG_FILE), &bytes)
    }
}

// ---------------------------------------------------------------------------
// Atomic writes
// ---------------------------------------------------------------------------

/// Write a file **atomically**.
///
/// The bytes go to a temp file in the same directory, which is then
/// renamed over the target, so readers never see a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes).map_err(|e| LockboxError::io_at(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| LockboxError::io_at(path, e))?;

    Ok(())
}
