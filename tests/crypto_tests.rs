//! Integration tests for the Lockbox crypto module.

use lockbox::crypto::digest::{DIGEST_LEN, SALT_LEN};
use lockbox::crypto::encryption::NONCE_LEN;
use lockbox::crypto::{decrypt, encrypt, ContentDigest, VaultKey};
use lockbox::errors::LockboxError;

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = VaultKey::new([0xABu8; 32]);
    let plaintext = b"DATABASE_URL=postgres://localhost/mydb";

    let ciphertext = encrypt(&key, plaintext).expect("encrypt should succeed");

    // Nonce prefix plus 16-byte tag.
    assert_eq!(ciphertext.len(), NONCE_LEN + plaintext.len() + 16);

    let recovered = decrypt(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = VaultKey::new([0xCDu8; 32]);
    let plaintext = b"SECRET=hello";

    let ct1 = encrypt(&key, plaintext).expect("encrypt 1");
    let ct2 = encrypt(&key, plaintext).expect("encrypt 2");

    // Each call draws a new random nonce.
    assert_ne!(ct1, ct2, "two encryptions of the same plaintext must differ");
}

#[test]
fn tampered_ciphertext_fails_to_decrypt() {
    let key = VaultKey::generate();
    let mut ct = encrypt(&key, b"payload").unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 0x01;

    assert!(matches!(
        decrypt(&key, &ct),
        Err(LockboxError::DecryptionFailed(_))
    ));
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[test]
fn key_text_roundtrip() {
    let key = VaultKey::generate();
    let text = key.encode();
    assert_eq!(text.len(), 52);
    assert!(!text.contains('='));

    let decoded = VaultKey::decode(&format!("  {text}\n")).unwrap();
    assert_eq!(decoded.as_bytes(), key.as_bytes());
}

#[test]
fn key_of_wrong_length_is_invalid() {
    assert!(matches!(
        VaultKey::decode("AAAA"),
        Err(LockboxError::InvalidKey(_))
    ));
    assert!(matches!(
        VaultKey::decode("not base32 at all!"),
        Err(LockboxError::InvalidKey(_))
    ));
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

#[test]
fn digest_layout_and_matching() {
    let plaintext = br#"{"ver":1,"data":"aGk","path":"a","perm":420}"#;
    let digest = ContentDigest::compute(plaintext);

    assert_eq!(digest.as_bytes().len(), DIGEST_LEN);
    assert_eq!(digest.to_base64().len(), 32);
    assert!(digest.matches(plaintext));

    let mut changed = plaintext.to_vec();
    changed[20] ^= 0x20;
    assert!(!digest.matches(&changed));
}

#[test]
fn digest_salt_is_reused_for_matching() {
    let salt = [1, 2, 3, 4];
    let digest = ContentDigest::with_salt(salt, b"content");
    assert_eq!(digest.salt(), salt);
    assert_eq!(&digest.as_bytes()[..SALT_LEN], &salt);
    assert_eq!(ContentDigest::with_salt(salt, b"content"), digest);

    let parsed = ContentDigest::from_base64(&digest.to_base64()).unwrap();
    assert_eq!(parsed, digest);
}
