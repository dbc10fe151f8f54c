//! The manifest: which project paths are tracked, and under which digest.
//!
//! On disk it is one `<base64url digest>\t<relative path>` line per entry,
//! sorted by path.  In memory the entries stay sorted too, so lookups
//! are binary searches.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::context::VaultContext;
use crate::crypto::ContentDigest;
use crate::errors::{LockboxError, Result};

use super::format::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Project-relative, `/`-separated. Unique within a manifest.
    pub rel_path: String,
    pub digest: ContentDigest,
    /// Derived from `rel_path` and the project path.
    pub abs_path: PathBuf,
}

#[derive(Debug)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    path: PathBuf,
}

impl Manifest {
    /// Load the manifest of `ctx`'s vault. A missing file is an empty manifest.
    pub fn load(ctx: &VaultContext) -> Result<Self> {
        let path = ctx.manifest_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(LockboxError::io_at(path, e)),
        };

        // Records are `\n`-terminated; only the final terminator may leave
        // an empty piece behind.
        let mut records: Vec<&str> = text.split('\n').collect();
        if records.last() == Some(&"") {
            records.pop();
        }

        let mut entries: Vec<ManifestEntry> = Vec::with_capacity(records.len());
        for line in records {
            let corrupt = || LockboxError::ManifestCorrupt {
                path: path.clone(),
                line: line.to_string(),
            };
            let (digest, rel_path) = line.split_once('\t').ok_or_else(corrupt)?;
            let digest = ContentDigest::from_base64(digest).ok_or_else(corrupt)?;
            if rel_path.is_empty() {
                return Err(corrupt());
            }
            entries.push(ManifestEntry {
                rel_path: rel_path.to_string(),
                digest,
                abs_path: ctx.project_abs(rel_path),
            });
        }
        entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        if let Some(pair) = entries.windows(2).find(|w| w[0].rel_path == w[1].rel_path) {
            return Err(LockboxError::ManifestCorrupt {
                path,
                line: format!("duplicate entry for {}", pair[1].rel_path),
            });
        }
        debug!("loaded {} manifest entries", entries.len());

        Ok(Self { entries, path })
    }

    /// Index of the entry for `rel_path`.
    pub fn find(&self, rel_path: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.rel_path.as_str().cmp(rel_path))
            .ok()
    }

    /// Insert an entry. The caller makes sure the path is not present yet.
    pub fn add(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
        self.entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    }

    /// Swap the entry at `index` for `entry` (same path), returning the old one.
    pub fn replace(&mut self, index: usize, entry: ManifestEntry) -> ManifestEntry {
        std::mem::replace(&mut self.entries[index], entry)
    }

    /// Remove the entry at `index`, keeping the rest in order.
    pub fn remove(&mut self, index: usize) -> ManifestEntry {
        self.entries.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<&ManifestEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize, sorted by path, one newline-terminated record per entry.
    pub fn to_text(&self) -> String {
        let mut sorted: Vec<&ManifestEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        sorted
            .iter()
            .map(|e| format!("{}\t{}\n", e.digest.to_base64(), e.rel_path))
            .collect()
    }

    /// Write the manifest back to disk atomically.
    pub fn export(&mut self) -> Result<()> {
        self.entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        write_atomic(&self.path, self.to_text().as_bytes())?;
        debug!("wrote {} manifest entries", self.entries.len());
        Ok(())
    }
}
