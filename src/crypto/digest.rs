//! Salted content digests.
//!
//! A `ContentDigest` names a stored object and doubles as its change
//! token.  It is 24 bytes:
//!
//! ```text
//! [ salt: 4 bytes | SHA-1(salt || canonical plaintext): 20 bytes ]
//! ```
//!
//! Every call to `compute` draws a new salt, so encoding the same file
//! twice yields two different digests.  Digests are never used for
//! deduplication; they only answer "is the live file still the one we
//! stored?" via `matches`, which reuses the stored salt.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

/// Number of random salt bytes at the front of a digest.
pub const SALT_LEN: usize = 4;

/// Total digest length: salt plus a SHA-1 output.
pub const DIGEST_LEN: usize = SALT_LEN + 20;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    /// Digest `plaintext` under a freshly drawn salt.
    pub fn compute(plaintext: &[u8]) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        Self::with_salt(salt, plaintext)
    }

    /// Digest `plaintext` under a given salt.
    pub fn with_salt(salt: [u8; SALT_LEN], plaintext: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(salt);
        hasher.update(plaintext);
        let hash = hasher.finalize();

        let mut out = [0u8; DIGEST_LEN];
        out[..SALT_LEN].copy_from_slice(&salt);
        out[SALT_LEN..].copy_from_slice(&hash);
        Self(out)
    }

    /// Rebuild a digest from its raw bytes. `None` unless exactly 24 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Parse the URL-safe, unpadded base64 form used in the manifest.
    pub fn from_base64(text: &str) -> Option<Self> {
        let raw = URL_SAFE_NO_PAD.decode(text).ok()?;
        Self::from_slice(&raw)
    }

    /// URL-safe, unpadded base64. Also the object's file name.
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    pub fn salt(&self) -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&self.0[..SALT_LEN]);
        salt
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Recompute over `plaintext` with this digest's salt and compare.
    pub fn matches(&self, plaintext: &[u8]) -> bool {
        let fresh = Self::with_salt(self.salt(), plaintext);
        self.0[SALT_LEN..].ct_eq(&fresh.0[SALT_LEN..]).into()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_base64())
    }
}
