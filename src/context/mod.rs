//! Vault resolution — which vault a command runs against.
//!
//! A `VaultContext` is built fresh for every command.  It finds the
//! nearest `.lockbox` directory above the starting path, loads the vault
//! identity (migrating legacy vaults on the way), and looks the vault key
//! up in the injected `KeyStore`.  A missing key is not fatal here: it is
//! kept in the context and only reported by operations that need it.

pub mod identity;
pub mod paths;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::KeyStore;
use crate::crypto::VaultKey;
use crate::errors::{LockboxError, Result};
use crate::vault::format::{VaultIdentity, DATA_DIR, MANIFEST_FILE, VAULT_DIR};

use identity::{load_identity, Loaded};

/// Everything a command needs to know about the active vault.
#[derive(Debug)]
pub struct VaultContext {
    /// Directory the command was started from, absolute and normalized.
    pub working_path: PathBuf,

    /// Parent of the vault directory; tracked paths are relative to it.
    pub project_path: PathBuf,

    /// The `.lockbox` directory itself.
    pub vault_root: PathBuf,

    /// Object store directory.
    pub data_path: PathBuf,

    pub identity: VaultIdentity,

    /// The key, or the message explaining why there is none.
    key: std::result::Result<VaultKey, String>,
}

impl VaultContext {
    /// Resolve the vault that contains `start`.
    ///
    /// A relative `start` is taken against the current directory.
    pub fn resolve(start: &Path, store: &mut dyn KeyStore) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let working_path = paths::absolutize(&cwd, start);

        let vault_root = find_vault_root(&working_path)
            .ok_or_else(|| LockboxError::VaultNotFound(working_path.clone()))?;
        let project_path = vault_root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| vault_root.clone());
        debug!("using vault {}", vault_root.display());

        let loaded = load_identity(&vault_root)?;
        let identity = loaded.identity().clone();

        if let Loaded::Migrated {
            legacy_key: Some(bytes),
            ..
        } = &loaded
        {
            if store.get_key(&identity.id).ok().flatten().is_none() {
                store.set_key(&identity.id, Some(bytes))?;
                info!("moved legacy key of {} into the registry", identity.id);
            }
        }

        if store.project_path(&identity.id).as_deref() != Some(project_path.as_path()) {
            debug!(
                "recording project path {} for vault {}",
                project_path.display(),
                identity.id
            );
            store.set_project_path(&identity.id, &project_path)?;
        }

        let key = match store.get_key(&identity.id) {
            Ok(Some(bytes)) => VaultKey::from_slice(&bytes).map_err(|_| {
                format!(
                    "the key for {} has the wrong size ({} bytes)",
                    project_path.display(),
                    bytes.len()
                )
            }),
            Ok(None) => Err(format!(
                "no key for {} found in the key registry",
                project_path.display()
            )),
            Err(e) => Err(e.to_string()),
        };

        Ok(Self {
            data_path: vault_root.join(DATA_DIR),
            working_path,
            project_path,
            vault_root,
            identity,
            key,
        })
    }

    /// Create a new vault in `dir` with a fresh identity and key.
    ///
    /// Nothing is left behind on failure: the new `.lockbox` directory is
    /// removed again if any later step fails.
    pub fn init(dir: &Path, store: &mut dyn KeyStore) -> Result<VaultIdentity> {
        let cwd = std::env::current_dir()?;
        let project_path = paths::absolutize(&cwd, dir);
        let vault_root = project_path.join(VAULT_DIR);

        if vault_root.exists() {
            return Err(LockboxError::VaultAlreadyExists(vault_root));
        }
        fs::create_dir_all(&vault_root).map_err(|e| LockboxError::io_at(&vault_root, e))?;

        match populate(&project_path, &vault_root, store) {
            Ok(identity) => Ok(identity),
            Err(e) => {
                let _ = fs::remove_dir_all(&vault_root);
                Err(e)
            }
        }
    }

    pub fn vault_id(&self) -> &str {
        &self.identity.id
    }

    pub fn patterns(&self) -> &[String] {
        &self.identity.patterns
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.vault_root.join(MANIFEST_FILE)
    }

    /// The vault key, or `KeyNotFound` explaining why it is missing.
    pub fn key(&self) -> Result<&VaultKey> {
        self.key
            .as_ref()
            .map_err(|msg| LockboxError::KeyNotFound(msg.clone()))
    }

    pub fn has_key(&self) -> bool {
        self.key.is_ok()
    }

    /// Store `key` for this vault.
    pub fn set_key(&mut self, store: &mut dyn KeyStore, key: VaultKey, force: bool) -> Result<()> {
        if self.has_key() && !force {
            return Err(LockboxError::KeyAlreadySet);
        }
        store.set_key(&self.identity.id, Some(key.as_bytes()))?;
        self.key = Ok(key);
        Ok(())
    }

    /// Forget the key for this vault.
    pub fn delete_key(&mut self, store: &mut dyn KeyStore) -> Result<()> {
        if !self.has_key() {
            return Err(LockboxError::CommandFailed("key is already unset".into()));
        }
        store.set_key(&self.identity.id, None)?;
        self.key = Err(format!(
            "no key for {} found in the key registry",
            self.project_path.display()
        ));
        Ok(())
    }

    /// Persist the identity record (after a pattern change).
    pub fn save_identity(&self) -> Result<()> {
        self.identity.write(&self.vault_root)
    }

    /// Check that every path belongs to this vault and not another one.
    pub fn ensure_same_vault(&self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            match find_vault_root(path) {
                Some(root) if root == self.vault_root => {}
                Some(other) => {
                    return Err(LockboxError::CrossVault {
                        path: self.rel_to_working(path),
                        other: self.rel_to_working(&other),
                        active: self.rel_to_working(&self.vault_root),
                    })
                }
                None => {
                    return Err(LockboxError::NotInVault {
                        path: self.rel_to_working(path),
                        active: self.rel_to_working(&self.vault_root),
                    })
                }
            }
        }
        Ok(())
    }

    /// Absolute form of a user-supplied path.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        paths::absolutize(&self.working_path, path)
    }

    /// A path as the user should see it: relative to the working directory.
    pub fn rel_to_working(&self, abs: &Path) -> String {
        match paths::relative_to(&self.working_path, abs) {
            Some(rel) => paths::to_slash(&rel),
            None => abs.display().to_string(),
        }
    }

    /// Manifest key for an absolute path. Starts with `..` when the path
    /// lies outside the project.
    pub fn project_rel(&self, abs: &Path) -> String {
        match paths::relative_to(&self.project_path, abs) {
            Some(rel) => paths::to_slash(&rel),
            None => abs.display().to_string(),
        }
    }

    /// Absolute path of a manifest key.
    pub fn project_abs(&self, rel: &str) -> PathBuf {
        paths::normalize(&self.project_path.join(rel))
    }
}

/// Nearest `.lockbox` directory at or above `start`.
///
/// `start` must be absolute. The filesystem root itself is never checked.
pub fn find_vault_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take_while(|dir| dir.parent().is_some())
        .map(|dir| dir.join(VAULT_DIR))
        .find(|candidate| candidate.is_dir())
}

fn populate(project_path: &Path, vault_root: &Path, store: &mut dyn KeyStore) -> Result<VaultIdentity> {
    let identity = VaultIdentity::generate();
    identity.write(vault_root)?;

    let data = vault_root.join(DATA_DIR);
    fs::create_dir(&data).map_err(|e| LockboxError::io_at(&data, e))?;

    let key = VaultKey::generate();
    store.set_key(&identity.id, Some(key.as_bytes()))?;
    store.set_project_path(&identity.id, project_path)?;
    info!("initialized vault {} in {}", identity.id, project_path.display());
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryKeyStore;
    use tempfile::TempDir;

    fn init_in(dir: &Path, store: &mut MemoryKeyStore) -> VaultIdentity {
        VaultContext::init(dir, store).unwrap()
    }

    #[test]
    fn resolve_finds_nearest_vault_from_subdir() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        let identity = init_in(tmp.path(), &mut store);

        let sub = tmp.path().join("a/b");
        fs::create_dir_all(&sub).unwrap();

        let ctx = VaultContext::resolve(&sub, &mut store).unwrap();
        assert_eq!(ctx.vault_id(), identity.id);
        assert_eq!(ctx.project_path, paths::normalize(tmp.path()));
        assert!(ctx.has_key());
    }

    #[test]
    fn resolve_without_vault_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        assert!(matches!(
            VaultContext::resolve(tmp.path(), &mut store),
            Err(LockboxError::VaultNotFound(_))
        ));
    }

    #[test]
    fn missing_key_is_deferred() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        let identity = init_in(tmp.path(), &mut store);
        store.set_key(&identity.id, None).unwrap();

        let ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();
        assert!(!ctx.has_key());
        assert!(matches!(ctx.key(), Err(LockboxError::KeyNotFound(_))));
    }

    #[test]
    fn wrong_size_key_is_key_not_found() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        let identity = init_in(tmp.path(), &mut store);
        store.set_key(&identity.id, Some(&[1u8; 7])).unwrap();

        let ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();
        let err = ctx.key().unwrap_err();
        assert!(err.to_string().contains("wrong size"));
    }

    #[test]
    fn resolve_heals_stale_project_path() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        let identity = init_in(tmp.path(), &mut store);
        store
            .set_project_path(&identity.id, Path::new("/somewhere/else"))
            .unwrap();

        VaultContext::resolve(tmp.path(), &mut store).unwrap();
        assert_eq!(
            store.project_path(&identity.id),
            Some(paths::normalize(tmp.path()))
        );
    }

    #[test]
    fn init_twice_fails() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        init_in(tmp.path(), &mut store);
        assert!(matches!(
            VaultContext::init(tmp.path(), &mut store),
            Err(LockboxError::VaultAlreadyExists(_))
        ));
    }

    #[test]
    fn set_key_needs_force_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        init_in(tmp.path(), &mut store);
        let mut ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();

        let new_key = VaultKey::new([3u8; 32]);
        assert!(matches!(
            ctx.set_key(&mut store, new_key.clone(), false),
            Err(LockboxError::KeyAlreadySet)
        ));
        ctx.set_key(&mut store, new_key, true).unwrap();
        assert_eq!(ctx.key().unwrap().as_bytes(), &[3u8; 32]);
        assert_eq!(
            store.get_key(ctx.vault_id()).unwrap(),
            Some(vec![3u8; 32])
        );
    }

    #[test]
    fn delete_key_twice_fails() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        init_in(tmp.path(), &mut store);
        let mut ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();

        ctx.delete_key(&mut store).unwrap();
        assert!(!ctx.has_key());
        assert!(ctx.delete_key(&mut store).is_err());
    }

    #[test]
    fn ensure_same_vault_rejects_nested_vault() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        init_in(tmp.path(), &mut store);
        let nested = tmp.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        init_in(&nested, &mut store);

        let ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();
        let own = ctx.absolutize(Path::new("top.txt"));
        let foreign = ctx.absolutize(Path::new("inner/secret.txt"));

        ctx.ensure_same_vault(&[own.clone()]).unwrap();
        assert!(matches!(
            ctx.ensure_same_vault(&[own, foreign]),
            Err(LockboxError::CrossVault { .. })
        ));
    }

    #[test]
    fn ensure_same_vault_rejects_paths_outside_any_vault() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        let project = tmp.path().join("proj");
        fs::create_dir_all(&project).unwrap();
        init_in(&project, &mut store);

        let ctx = VaultContext::resolve(&project, &mut store).unwrap();
        let outside = paths::normalize(&tmp.path().join("loose.txt"));
        assert!(matches!(
            ctx.ensure_same_vault(&[outside]),
            Err(LockboxError::NotInVault { .. })
        ));
    }

    #[test]
    fn project_rel_and_abs_are_inverse() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemoryKeyStore::new();
        init_in(tmp.path(), &mut store);
        let ctx = VaultContext::resolve(tmp.path(), &mut store).unwrap();

        let abs = ctx.absolutize(Path::new("foo/b"));
        assert_eq!(ctx.project_rel(&abs), "foo/b");
        assert_eq!(ctx.project_abs("foo/b"), abs);
        assert!(paths::escapes(&ctx.project_rel(&ctx.absolutize(Path::new("../x")))));
    }
}
