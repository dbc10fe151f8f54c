//! Cryptographic primitives for Lockbox.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption of sealed objects (`encryption`)
//! - The vault's 32-byte symmetric key (`keys`)
//! - Salted SHA-1 content digests used as object names and change tokens (`digest`)

pub mod digest;
pub mod encryption;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, ContentDigest, VaultKey};
pub use digest::ContentDigest;
pub use encryption::{decrypt, encrypt};
pub use keys::VaultKey;
