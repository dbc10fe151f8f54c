//! Loading a vault's identity record, one layout version at a time.
//!
//! Each loader recognises exactly one on-disk layout.  `load_identity`
//! asks them in order and takes the first answer, so an old vault is
//! migrated the first time it is touched and read by `CurrentFormat`
//! every time after that.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::crypto::keys::KEY_LEN;
use crate::errors::{LockboxError, Result};
use crate::vault::format::{VaultIdentity, CONFIG_FILE, LEGACY_KEY_FILE};

/// What a loader found.
#[derive(Debug)]
pub enum Loaded {
    /// The identity record was already in the current format.
    Current(VaultIdentity),

    /// The vault was migrated. `legacy_key` carries a key found in the
    /// old per-vault key file, for the caller to move into the registry.
    Migrated {
        identity: VaultIdentity,
        legacy_key: Option<Vec<u8>>,
    },
}

impl Loaded {
    pub fn identity(&self) -> &VaultIdentity {
        match self {
            Self::Current(identity) | Self::Migrated { identity, .. } => identity,
        }
    }
}

/// One on-disk layout.
pub trait IdentityLoader {
    /// `Ok(None)` means "not this layout".
    fn try_load(&self, vault_root: &Path) -> Result<Option<Loaded>>;
}

/// `.lockbox/config` exists and holds a JSON identity record.
pub struct CurrentFormat;

impl IdentityLoader for CurrentFormat {
    fn try_load(&self, vault_root: &Path) -> Result<Option<Loaded>> {
        let path = vault_root.join(CONFIG_FILE);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(Loaded::Current(VaultIdentity::from_json(&bytes)?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LockboxError::io_at(path, e)),
        }
    }
}

/// A vault from before identity records: no `config`, possibly a raw
/// 32-byte `key` file.
pub struct LegacyLayout;

impl IdentityLoader for LegacyLayout {
    fn try_load(&self, vault_root: &Path) -> Result<Option<Loaded>> {
        if vault_root.join(CONFIG_FILE).exists() {
            return Ok(None);
        }

        let identity = VaultIdentity::generate();
        identity.write(vault_root)?;
        info!(
            "created identity {} for legacy vault {}",
            identity.id,
            vault_root.display()
        );

        let key_path = vault_root.join(LEGACY_KEY_FILE);
        let legacy_key = match fs::read(&key_path) {
            Ok(bytes) if bytes.len() == KEY_LEN => Some(bytes),
            Ok(bytes) => {
                warn!(
                    "ignoring {}: expected {KEY_LEN} bytes, found {}",
                    key_path.display(),
                    bytes.len()
                );
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(LockboxError::io_at(key_path, e)),
        };

        Ok(Some(Loaded::Migrated {
            identity,
            legacy_key,
        }))
    }
}

/// Loaders in the order they are tried.
const LOADERS: &[&dyn IdentityLoader] = &[&CurrentFormat, &LegacyLayout];

/// Load (and if needed migrate) the identity of the vault at `vault_root`.
pub fn load_identity(vault_root: &Path) -> Result<Loaded> {
    for loader in LOADERS {
        if let Some(loaded) = loader.try_load(vault_root)? {
            return Ok(loaded);
        }
    }
    Err(LockboxError::ConfigError(format!(
        "unrecognised vault layout in {}",
        vault_root.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn current_format_is_read_as_is() {
        let dir = TempDir::new().unwrap();
        let identity = VaultIdentity::generate();
        identity.write(dir.path()).unwrap();

        match load_identity(dir.path()).unwrap() {
            Loaded::Current(found) => assert_eq!(found, identity),
            other => panic!("expected current format, got {other:?}"),
        }
    }

    #[test]
    fn legacy_vault_is_migrated_once() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LEGACY_KEY_FILE), [5u8; 32]).unwrap();

        let first = load_identity(dir.path()).unwrap();
        let id = match &first {
            Loaded::Migrated {
                identity,
                legacy_key,
            } => {
                assert_eq!(legacy_key.as_deref(), Some(&[5u8; 32][..]));
                identity.id.clone()
            }
            other => panic!("expected migration, got {other:?}"),
        };

        // Second load sees the record written by the first.
        match load_identity(dir.path()).unwrap() {
            Loaded::Current(found) => assert_eq!(found.id, id),
            other => panic!("expected current format, got {other:?}"),
        }
    }

    #[test]
    fn legacy_key_of_wrong_size_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LEGACY_KEY_FILE), [5u8; 10]).unwrap();

        match load_identity(dir.path()).unwrap() {
            Loaded::Migrated { legacy_key, .. } => assert!(legacy_key.is_none()),
            other => panic!("expected migration, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_config_is_an_error_not_a_migration() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), b"{nope").unwrap();
        assert!(matches!(
            load_identity(dir.path()),
            Err(LockboxError::ConfigError(_))
        ));
    }
}
