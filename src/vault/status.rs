//! Comparing the manifest and registered patterns with the working tree.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use crate::context::VaultContext;
use crate::crypto::ContentDigest;
use crate::errors::Result;
use crate::pattern::{self, PathGlob};

use super::manifest::Manifest;
use super::object::SecretObject;

/// How a tracked (or trackable) file compares with the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    /// Live file matches the stored digest.
    Unchanged,
    /// Live file differs from the stored object.
    Updated,
    /// Tracked, but the live file is missing or unreadable.
    Unavailable,
    /// Matched by a registered pattern but not tracked yet.
    New,
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unchanged => "false",
            Self::Updated => "true",
            Self::Unavailable => "unavailable",
            Self::New => "new file",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    /// Project-relative path.
    pub path: String,
    pub abs_path: PathBuf,
    /// `None` for files that are not tracked yet.
    pub digest: Option<ContentDigest>,
    pub state: StatusState,
    /// First registered pattern (in stored order) matching `path`.
    pub pattern: Option<String>,
}

/// Build the status rows for a vault, sorted by path.
pub fn compute(ctx: &VaultContext, manifest: &Manifest) -> Result<Vec<StatusRow>> {
    let mut candidates: BTreeSet<PathBuf> = BTreeSet::new();
    for registered in ctx.patterns() {
        let expanded = PathGlob::new(&ctx.project_abs(registered)).and_then(|g| g.expand());
        match expanded {
            Ok(files) => candidates.extend(files),
            Err(e) => warn!("skipping pattern {registered}: {e}"),
        }
    }

    let mut rows = Vec::with_capacity(manifest.len() + candidates.len());
    for entry in manifest.entries() {
        let state = match SecretObject::matches_current(ctx, &entry.digest, &entry.abs_path) {
            Ok(true) => StatusState::Unchanged,
            Ok(false) => StatusState::Updated,
            Err(_) => StatusState::Unavailable,
        };
        candidates.remove(&entry.abs_path);
        rows.push(StatusRow {
            path: entry.rel_path.clone(),
            abs_path: entry.abs_path.clone(),
            digest: Some(entry.digest),
            state,
            pattern: None,
        });
    }

    for abs_path in candidates {
        rows.push(StatusRow {
            path: ctx.project_rel(&abs_path),
            abs_path,
            digest: None,
            state: StatusState::New,
            pattern: None,
        });
    }

    rows.sort_by(|a, b| a.path.cmp(&b.path));
    for row in &mut rows {
        row.pattern = ctx
            .patterns()
            .iter()
            .find(|p| pattern::matches(p, &row.path).unwrap_or(false))
            .cloned();
    }
    Ok(rows)
}
