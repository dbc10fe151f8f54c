//! High-level vault operations used by CLI commands.
//!
//! `Vault` ties a resolved `VaultContext` to its manifest and object
//! store and reconciles them with the working tree.  Batch operations
//! never stop at the first bad file: each failure is recorded in the
//! operation's report, everything that did succeed is persisted, and
//! `BatchReport::into_result` turns leftover failures into a single
//! `LockboxError::Incomplete`.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::context::paths::escapes;
use crate::context::VaultContext;
use crate::crypto::VaultKey;
use crate::errors::{Failure, LockboxError, Result};
use crate::pattern::{Input, PathGlob};

use super::manifest::{Manifest, ManifestEntry};
use super::object::{ObjectStore, SecretObject};
use super::status::{self, StatusRow};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// A report that may carry per-item failures.
pub trait BatchReport: Sized {
    /// Past participle used in the aggregate error ("added", "closed", ...).
    const ACTION: &'static str;

    fn failures_mut(&mut self) -> &mut Vec<Failure>;

    /// `Ok(self)` if nothing failed, otherwise `Incomplete` with every failure.
    fn into_result(mut self) -> Result<Self> {
        let failures = std::mem::take(self.failures_mut());
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(LockboxError::Incomplete {
                action: Self::ACTION,
                failures,
            })
        }
    }
}

macro_rules! batch_report {
    ($ty:ty, $action:literal) => {
        impl BatchReport for $ty {
            const ACTION: &'static str = $action;

            fn failures_mut(&mut self) -> &mut Vec<Failure> {
                &mut self.failures
            }
        }
    };
}

#[derive(Debug, Default)]
pub struct AddReport {
    /// Project-relative paths written to the vault.
    pub files_added: Vec<String>,
    /// Patterns newly registered.
    pub patterns_added: Vec<String>,
    /// Anchored project-relative form of each input that matched something.
    pub ignore_entries: Vec<String>,
    pub failures: Vec<Failure>,
}
batch_report!(AddReport, "added");

#[derive(Debug, Default)]
pub struct RemoveReport {
    pub files_removed: Vec<String>,
    pub patterns_removed: Vec<String>,
    /// Inputs that matched neither a pattern nor a tracked file.
    pub unmatched: Vec<String>,
    pub failures: Vec<Failure>,
}
batch_report!(RemoveReport, "removed");

#[derive(Debug, Default)]
pub struct CommitReport {
    pub updated: Vec<String>,
    /// Tracked files with no live copy; left as they are.
    pub missing: Vec<String>,
    pub failures: Vec<Failure>,
}
batch_report!(CommitReport, "committed");

#[derive(Debug, Default)]
pub struct OpenReport {
    pub opened: Vec<String>,
    /// Live file already matches the vault.
    pub unchanged: Vec<String>,
    /// Live file differs and was left alone (no force).
    pub skipped: Vec<String>,
    pub failures: Vec<Failure>,
}
batch_report!(OpenReport, "opened");

#[derive(Debug, Default)]
pub struct CloseReport {
    pub closed: Vec<String>,
    pub failures: Vec<Failure>,
}
batch_report!(CloseReport, "closed");

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// The main vault handle. Build one with `Vault::load`.
#[derive(Debug)]
pub struct Vault {
    ctx: VaultContext,
    manifest: Manifest,
    objects: ObjectStore,
}

impl Vault {
    /// Load the manifest of a resolved vault, creating `data/` if needed.
    pub fn load(ctx: VaultContext) -> Result<Self> {
        fs::create_dir_all(&ctx.data_path).map_err(|e| LockboxError::io_at(&ctx.data_path, e))?;
        let manifest = Manifest::load(&ctx)?;
        let objects = ObjectStore::new(&ctx.data_path);
        Ok(Self {
            ctx,
            manifest,
            objects,
        })
    }

    pub fn context(&self) -> &VaultContext {
        &self.ctx
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Tracked paths, in manifest order.
    pub fn ls(&self) -> Vec<String> {
        self.manifest
            .entries()
            .iter()
            .map(|e| e.rel_path.clone())
            .collect()
    }

    /// Registered patterns.
    pub fn patterns(&self) -> &[String] {
        self.ctx.patterns()
    }

    // ------------------------------------------------------------------
    // add
    // ------------------------------------------------------------------

    /// Track files, directories and glob patterns.
    ///
    /// Directories are registered as `dir/**`; anything that does not
    /// exist is taken as a glob and registered as is.
    pub fn add(&mut self, inputs: &[PathBuf], force: bool) -> Result<AddReport> {
        let key = self.ctx.key()?.clone();
        let absolute: Vec<PathBuf> = inputs.iter().map(|p| self.ctx.absolutize(p)).collect();
        self.ctx.ensure_same_vault(&absolute)?;

        let mut report = AddReport::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut patterns_changed = false;

        for (input, abs) in inputs.iter().zip(&absolute) {
            let shown = input.display().to_string();

            let (files, glob) = match Input::classify(abs) {
                Input::File(file) => (vec![file], None),
                Input::Directory(glob) | Input::Pattern(glob) => {
                    match PathGlob::new(&glob).and_then(|g| g.expand()) {
                        Ok(files) => (files, Some(glob)),
                        Err(e) => {
                            report.failures.push(Failure::new(shown, e));
                            continue;
                        }
                    }
                }
            };

            if files.is_empty() {
                report
                    .failures
                    .push(Failure::new(shown.clone(), LockboxError::NoGlobMatches(shown)));
                continue;
            }

            let matched = glob.as_deref().unwrap_or(abs.as_path());
            let rel = self.ctx.project_rel(matched);
            if !escapes(&rel) && !matched.starts_with(&self.ctx.vault_root) {
                if glob.is_some() && self.ctx.identity.add_pattern(&rel) {
                    report.patterns_added.push(rel.clone());
                    patterns_changed = true;
                }
                report.ignore_entries.push(format!("/{rel}"));
            }

            for file in files {
                if !seen.insert(file.clone()) {
                    continue;
                }
                match self.add_file(&key, &file, force) {
                    Ok(rel) => report.files_added.push(rel),
                    Err(e) => report
                        .failures
                        .push(Failure::new(self.ctx.rel_to_working(&file), e)),
                }
            }
        }

        if patterns_changed {
            self.ctx.save_identity()?;
        }
        if !report.files_added.is_empty() {
            self.manifest.export()?;
        }
        Ok(report)
    }

    /// Seal one file and point its manifest entry at the new object.
    fn add_file(&mut self, key: &VaultKey, abs: &Path, force: bool) -> Result<String> {
        let rel = self.ctx.project_rel(abs);
        if escapes(&rel) {
            return Err(LockboxError::OutsideProject(self.ctx.rel_to_working(abs)));
        }
        if abs.starts_with(&self.ctx.vault_root) {
            return Err(LockboxError::InsideVaultDir(self.ctx.rel_to_working(abs)));
        }
        // One manifest record per line.
        if rel.contains(['\n', '\r']) {
            return Err(LockboxError::UnsupportedPath(format!("{rel:?}")));
        }

        let existing = self.manifest.find(&rel);
        if existing.is_some() && !force {
            return Err(LockboxError::AlreadyTracked(self.ctx.rel_to_working(abs)));
        }

        let object = SecretObject::from_file(&self.ctx, abs)?;
        let (digest, sealed) = object.seal(key)?;
        self.objects.write(&digest, &sealed)?;

        let entry = ManifestEntry {
            rel_path: rel.clone(),
            digest,
            abs_path: abs.to_path_buf(),
        };
        match existing {
            Some(index) => {
                let old = self.manifest.replace(index, entry);
                if let Err(e) = self.objects.remove(&old.digest) {
                    warn!("could not delete old object for {rel}: {e}");
                }
            }
            None => self.manifest.add(entry),
        }

        debug!("sealed {rel} as {digest}");
        Ok(rel)
    }

    // ------------------------------------------------------------------
    // remove
    // ------------------------------------------------------------------

    /// Stop tracking files and patterns. Does not need the key.
    ///
    /// Live files are left alone; only the vault copies go.
    pub fn remove(&mut self, inputs: &[PathBuf]) -> Result<RemoveReport> {
        let mut report = RemoveReport::default();
        let mut patterns_changed = false;
        let mut globs: Vec<(String, PathGlob, bool)> = Vec::new();

        for input in inputs {
            let shown = input.display().to_string();
            let mut abs = self.ctx.absolutize(input);
            if abs.is_dir() {
                abs = abs.join("**");
            }

            let mut hit = false;
            for candidate in [self.ctx.project_rel(&abs), shown.clone()] {
                if self.ctx.identity.remove_pattern(&candidate) {
                    report.patterns_removed.push(candidate);
                    patterns_changed = true;
                    hit = true;
                    break;
                }
            }

            match PathGlob::new(&abs) {
                Ok(glob) => globs.push((shown, glob, hit)),
                Err(e) => report.failures.push(Failure::new(shown, e)),
            }
        }

        let mut index = 0;
        while let Some(entry) = self.manifest.get(index) {
            let mut matched = false;
            for (_, glob, hit) in globs.iter_mut() {
                if glob.is_match(&entry.abs_path) {
                    *hit = true;
                    matched = true;
                }
            }
            if !matched {
                index += 1;
                continue;
            }

            let entry = self.manifest.remove(index);
            if let Err(e) = self.objects.remove(&entry.digest) {
                report
                    .failures
                    .push(Failure::new(self.ctx.rel_to_working(&entry.abs_path), e));
            }
            debug!("removed {}", entry.rel_path);
            report.files_removed.push(entry.rel_path);
        }

        report.unmatched = globs
            .into_iter()
            .filter(|(_, _, hit)| !hit)
            .map(|(shown, _, _)| shown)
            .collect();

        if patterns_changed {
            self.ctx.save_identity()?;
        }
        if !report.files_removed.is_empty() {
            self.manifest.export()?;
        }
        Ok(report)
    }

    // ------------------------------------------------------------------
    // commit
    // ------------------------------------------------------------------

    /// Re-seal every tracked file whose live copy has changed.
    pub fn commit(&mut self) -> Result<CommitReport> {
        let key = self.ctx.key()?.clone();
        let mut report = CommitReport::default();

        for index in 0..self.manifest.len() {
            let Some(entry) = self.manifest.get(index).cloned() else {
                break;
            };
            let shown = self.ctx.rel_to_working(&entry.abs_path);

            match SecretObject::matches_current(&self.ctx, &entry.digest, &entry.abs_path) {
                Ok(true) => {}
                Ok(false) => match self.add_file(&key, &entry.abs_path, true) {
                    Ok(rel) => report.updated.push(rel),
                    Err(e) => report.failures.push(Failure::new(shown, e)),
                },
                Err(e) if e.is_not_found() => {
                    warn!("{shown} is missing, skipping");
                    report.missing.push(entry.rel_path);
                }
                Err(e) => report.failures.push(Failure::new(shown, e)),
            }
        }

        if !report.updated.is_empty() {
            self.manifest.export()?;
        }
        Ok(report)
    }

    // ------------------------------------------------------------------
    // status
    // ------------------------------------------------------------------

    /// Compare tracked files and pattern matches with the working tree.
    /// Does not need the key.
    pub fn status(&self) -> Result<Vec<StatusRow>> {
        status::compute(&self.ctx, &self.manifest)
    }

    // ------------------------------------------------------------------
    // open / close
    // ------------------------------------------------------------------

    /// Write every tracked file back into the working tree.
    ///
    /// A live file that differs from the vault is kept unless `force`.
    pub fn open(&self, force: bool) -> Result<OpenReport> {
        let key = self.ctx.key()?;
        let mut report = OpenReport::default();

        for entry in self.manifest.entries() {
            let shown = self.ctx.rel_to_working(&entry.abs_path);

            match fs::symlink_metadata(&entry.abs_path) {
                Ok(_) => {
                    match SecretObject::matches_current(&self.ctx, &entry.digest, &entry.abs_path) {
                        Ok(true) => {
                            report.unchanged.push(entry.rel_path.clone());
                            continue;
                        }
                        Ok(false) if !force => {
                            debug!("{shown} has changed, not overwriting");
                            report.skipped.push(entry.rel_path.clone());
                            continue;
                        }
                        Ok(false) => {}
                        Err(e) if !force => {
                            report.failures.push(Failure::new(shown, e));
                            continue;
                        }
                        Err(_) => {}
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    report
                        .failures
                        .push(Failure::new(shown, LockboxError::io_at(&entry.abs_path, e)));
                    continue;
                }
            }

            match self.restore_entry(key, entry) {
                Ok(()) => {
                    debug!("opened {}", entry.rel_path);
                    report.opened.push(entry.rel_path.clone());
                }
                Err(e) => report.failures.push(Failure::new(shown, e)),
            }
        }
        Ok(report)
    }

    fn restore_entry(&self, key: &VaultKey, entry: &ManifestEntry) -> Result<()> {
        let sealed = self.objects.read(&entry.digest)?;
        let object = SecretObject::open(&sealed, key)?;
        if object.rel_path != entry.rel_path {
            return Err(LockboxError::CorruptObject(format!(
                "object {} holds {}, expected {}",
                entry.digest, object.rel_path, entry.rel_path
            )));
        }
        object.restore(&entry.abs_path)
    }

    /// Delete the live copy of every tracked file.
    ///
    /// Needs the key so that whatever is closed can be opened again. A
    /// file that changed since the last commit is kept unless `force`.
    pub fn close(&self, force: bool) -> Result<CloseReport> {
        self.ctx.key()?;
        let mut report = CloseReport::default();

        for entry in self.manifest.entries() {
            let shown = self.ctx.rel_to_working(&entry.abs_path);

            match fs::symlink_metadata(&entry.abs_path) {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    report
                        .failures
                        .push(Failure::new(shown, LockboxError::io_at(&entry.abs_path, e)));
                    continue;
                }
            }

            if !self.objects.path_for(&entry.digest).is_file() {
                report.failures.push(Failure::new(
                    shown,
                    LockboxError::CorruptObject(format!(
                        "object {} for {} is missing",
                        entry.digest, entry.rel_path
                    )),
                ));
                continue;
            }

            if !force {
                match SecretObject::matches_current(&self.ctx, &entry.digest, &entry.abs_path) {
                    Ok(true) => {}
                    Ok(false) => {
                        report
                            .failures
                            .push(Failure::new(shown.clone(), LockboxError::FileChanged(shown)));
                        continue;
                    }
                    Err(e) => {
                        report.failures.push(Failure::new(shown, e));
                        continue;
                    }
                }
            }

            match fs::remove_file(&entry.abs_path) {
                Ok(()) => {
                    debug!("closed {}", entry.rel_path);
                    report.closed.push(entry.rel_path.clone());
                }
                Err(e) => report
                    .failures
                    .push(Failure::new(shown, LockboxError::io_at(&entry.abs_path, e))),
            }
        }
        Ok(report)
    }
}
