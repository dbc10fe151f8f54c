//! Vault module — tracked files and their encrypted copies.
//!
//! This module provides:
//! - On-disk layout, identity record and atomic writes (`format`)
//! - The sealed `SecretObject` codec and the object store (`object`)
//! - The path-to-digest `Manifest` (`manifest`)
//! - Status rows for the working tree (`status`)
//! - The `Vault` reconciler behind every file command (`store`)

pub mod format;
pub mod manifest;
pub mod object;
pub mod status;
pub mod store;

// Re-export the most commonly used items.
pub use format::VaultIdentity;
pub use manifest::{Manifest, ManifestEntry};
pub use object::{ObjectStore, SecretObject};
pub use status::{StatusRow, StatusState};
pub use store::{
    AddReport, BatchReport, CloseReport, CommitReport, OpenReport, RemoveReport, Vault,
};
