use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::KeyStore;
use crate::errors::Result;

/// A `KeyStore` that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    keys: HashMap<String, Vec<u8>>,
    paths: HashMap<String, PathBuf>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn get_key(&self, vault_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.keys.get(vault_id).cloned())
    }

    fn set_key(&mut self, vault_id: &str, key: Option<&[u8]>) -> Result<()> {
        match key {
            Some(k) => {
                self.keys.insert(vault_id.to_string(), k.to_vec());
            }
            None => {
                self.keys.remove(vault_id);
            }
        }
        Ok(())
    }

    fn project_path(&self, vault_id: &str) -> Option<PathBuf> {
        self.paths.get(vault_id).cloned()
    }

    fn set_project_path(&mut self, vault_id: &str, path: &Path) -> Result<()> {
        self.paths.insert(vault_id.to_string(), path.to_path_buf());
        Ok(())
    }
}
