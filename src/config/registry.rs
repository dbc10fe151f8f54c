use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use data_encoding::BASE32_NOPAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::KeyStore;
use crate::errors::{LockboxError, Result};
use crate::vault::format::write_atomic;

/// Environment variable that overrides the registry location.
pub const CONFIG_ENV: &str = "LOCKBOX_CONFIG";

/// Per-user registry, loaded from `~/.lockbox.toml`.
///
/// Every field has a sensible default so Lockbox works out-of-the-box
/// without any registry file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    /// Skip `.gitignore` maintenance on `add`.
    #[serde(default)]
    pub no_update_gitignore: bool,

    /// Known vaults, keyed by vault id.
    #[serde(default)]
    pub vaults: BTreeMap<String, VaultEntry>,

    /// Where this registry is read from and written to.
    #[serde(skip)]
    path: PathBuf,
}

/// What the registry remembers about one vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultEntry {
    /// The vault key, standard base32 without padding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Project directory the vault was last resolved in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Registry {
    /// Name of the registry file in the home directory.
    const FILE_NAME: &'static str = ".lockbox.toml";

    /// Pick the registry location: explicit path, then `LOCKBOX_CONFIG`,
    /// then `~/.lockbox.toml`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .map(|home| home.join(Self::FILE_NAME))
            .ok_or_else(|| {
                LockboxError::ConfigError(format!(
                    "cannot find a home directory - set {CONFIG_ENV} or pass --config"
                ))
            })
    }

    /// Load the registry at `path`.
    ///
    /// If the file does not exist, an empty registry is returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no registry at {}, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                ..Self::default()
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| LockboxError::io_at(path, e))?;

        let mut registry: Registry = toml::from_str(&contents).map_err(|e| {
            LockboxError::ConfigError(format!("failed to parse {}: {e}", path.display()))
        })?;
        registry.path = path.to_path_buf();

        Ok(registry)
    }

    /// Write the registry back to its file.
    pub fn save(&self) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| LockboxError::SerializationError(format!("registry: {e}")))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LockboxError::io_at(parent, e))?;
            }
        }
        write_atomic(&self.path, text.as_bytes())
    }

    /// Returns the path of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyStore for Registry {
    fn get_key(&self, vault_id: &str) -> Result<Option<Vec<u8>>> {
        let Some(text) = self.vaults.get(vault_id).and_then(|v| v.key.as_deref()) else {
            return Ok(None);
        };
        if text.is_empty() {
            return Ok(None);
        }
        BASE32_NOPAD.decode(text.as_bytes()).map(Some).map_err(|e| {
            LockboxError::KeyNotFound(format!(
                "error reading key for vault {vault_id} in {}: {e}",
                self.path.display()
            ))
        })
    }

    fn set_key(&mut self, vault_id: &str, key: Option<&[u8]>) -> Result<()> {
        let entry = self.vaults.entry(vault_id.to_string()).or_default();
        entry.key = key.map(|k| BASE32_NOPAD.encode(k));
        self.save()
    }

    fn project_path(&self, vault_id: &str) -> Option<PathBuf> {
        self.vaults.get(vault_id).and_then(|v| v.path.clone())
    }

    fn set_project_path(&mut self, vault_id: &str, path: &Path) -> Result<()> {
        let entry = self.vaults.entry(vault_id.to_string()).or_default();
        entry.path = Some(path.to_path_buf());
        self.save()
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_returns_empty_registry_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let reg = Registry::load(&tmp.path().join("reg.toml")).unwrap();
        assert!(reg.vaults.is_empty());
        assert!(!reg.no_update_gitignore);
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reg.toml");
        let config = r#"
no_update_gitignore = true

[vaults.abc]
key = "AEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQ"
path = "/home/user/project"
"#;
        fs::write(&path, config).unwrap();

        let reg = Registry::load(&path).unwrap();
        assert!(reg.no_update_gitignore);
        assert_eq!(reg.get_key("abc").unwrap().unwrap(), vec![1u8; 32]);
        assert_eq!(
            reg.project_path("abc"),
            Some(PathBuf::from("/home/user/project"))
        );
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reg.toml");
        fs::write(&path, "not valid {{toml").unwrap();

        assert!(matches!(
            Registry::load(&path),
            Err(LockboxError::ConfigError(_))
        ));
    }

    #[test]
    fn setters_persist_immediately() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("reg.toml");

        let mut reg = Registry::load(&path).unwrap();
        reg.set_key("v1", Some(&[9u8; 32])).unwrap();
        reg.set_project_path("v1", Path::new("/p")).unwrap();

        let again = Registry::load(&path).unwrap();
        assert_eq!(again.get_key("v1").unwrap().unwrap(), vec![9u8; 32]);
        assert_eq!(again.project_path("v1"), Some(PathBuf::from("/p")));
    }

    #[test]
    fn clearing_a_key_keeps_the_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reg.toml");

        let mut reg = Registry::load(&path).unwrap();
        reg.set_key("v1", Some(&[9u8; 32])).unwrap();
        reg.set_project_path("v1", Path::new("/p")).unwrap();
        reg.set_key("v1", None).unwrap();

        let again = Registry::load(&path).unwrap();
        assert_eq!(again.get_key("v1").unwrap(), None);
        assert_eq!(again.project_path("v1"), Some(PathBuf::from("/p")));
    }

    #[test]
    fn undecodable_key_is_key_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reg.toml");
        fs::write(&path, "[vaults.v1]\nkey = \"@@@\"\n").unwrap();

        let reg = Registry::load(&path).unwrap();
        assert!(matches!(
            reg.get_key("v1"),
            Err(LockboxError::KeyNotFound(_))
        ));
    }

    #[test]
    fn locate_prefers_explicit_path() {
        let explicit = Path::new("/tmp/custom.toml");
        assert_eq!(Registry::locate(Some(explicit)).unwrap(), explicit);
    }
}
