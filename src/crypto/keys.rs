//! The vault's symmetric key.
//!
//! Every vault has one random 32-byte key, kept outside the project in
//! the key registry.  On the command line and in the registry the key is
//! written as standard base32 without padding (52 characters).

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use zeroize::Zeroize;

use crate::errors::{LockboxError, Result};

/// Length of the vault key (256 bits).
pub const KEY_LEN: usize = 32;

/// A wrapper around the 32-byte vault key that automatically zeroes
/// its memory when dropped.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Create a new `VaultKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Build a key from a byte slice, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            LockboxError::InvalidKey(format!(
                "key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::new(arr))
    }

    /// Parse the text form used by the registry and `set-key`.
    pub fn decode(text: &str) -> Result<Self> {
        let mut raw = BASE32_NOPAD
            .decode(text.trim().as_bytes())
            .map_err(|e| LockboxError::InvalidKey(e.to_string()))?;
        let key = Self::from_slice(&raw);
        raw.zeroize();
        key
    }

    /// The text form of this key.
    pub fn encode(&self) -> String {
        BASE32_NOPAD.encode(&self.bytes)
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let key = VaultKey::generate();
        let back = VaultKey::decode(&key.encode()).unwrap();
        assert_eq!(key.as_bytes(), back.as_bytes());
    }

    #[test]
    fn encoded_key_is_52_base32_chars() {
        let text = VaultKey::new([7; 32]).encode();
        assert_eq!(text.len(), 52);
        assert!(text.chars().all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn decodes_known_base32_key() {
        let text = "A".repeat(51) + "Q";
        let key = VaultKey::decode(&text).unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let short = BASE32_NOPAD.encode(&[1u8; 16]);
        assert!(matches!(
            VaultKey::decode(&short),
            Err(LockboxError::InvalidKey(_))
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(VaultKey::decode("not base32 at all!").is_err());
    }

    #[test]
    fn generated_keys_differ() {
        assert_ne!(VaultKey::generate().as_bytes(), VaultKey::generate().as_bytes());
    }

    #[test]
    fn debug_does_not_leak_bytes() {
        let key = VaultKey::new([0xAB; 32]);
        assert_eq!(format!("{key:?}"), "VaultKey(..)");
    }
}
