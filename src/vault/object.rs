//! Sealed secret objects and the flat object store.
//!
//! A tracked file is captured as a `SecretObject`, serialized to a
//! canonical JSON plaintext, digested, then compressed and encrypted:
//!
//! ```text
//! file ──▶ {"ver":1,"data":<b64>,"path":"…","perm":N} ──▶ zlib ──▶ AES-256-GCM
//!                         │
//!                         └──▶ ContentDigest (object file name)
//! ```
//!
//! The digest is always taken over the plaintext, before encryption.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::VaultContext;
use crate::crypto::{decrypt, encrypt, ContentDigest, VaultKey};
use crate::errors::{LockboxError, Result};

use super::format::write_atomic;

/// Object format version written into every plaintext.
pub const OBJECT_VERSION: u32 = 1;

/// One tracked file: its bytes plus the metadata needed to restore it.
///
/// Field order is the canonical plaintext order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretObject {
    #[serde(rename = "ver")]
    pub version: u32,

    /// File contents, base64 (standard alphabet, no padding) in JSON.
    #[serde(
        rename = "data",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub payload: Vec<u8>,

    /// Project-relative, `/`-separated.
    #[serde(rename = "path")]
    pub rel_path: String,

    /// Permission bits (`mode & 0o777`).
    #[serde(rename = "perm")]
    pub permissions: u32,
}

impl SecretObject {
    /// Capture a live file. Symlinks and other non-regular files are refused.
    pub fn from_file(ctx: &VaultContext, abs: &Path) -> Result<Self> {
        let meta = fs::symlink_metadata(abs).map_err(|e| LockboxError::io_at(abs, e))?;
        if !meta.is_file() {
            return Err(LockboxError::NotRegularFile(ctx.rel_to_working(abs)));
        }
        let payload = fs::read(abs).map_err(|e| LockboxError::io_at(abs, e))?;

        Ok(Self {
            version: OBJECT_VERSION,
            payload,
            rel_path: ctx.project_rel(abs),
            permissions: permission_bits(&meta),
        })
    }

    /// The canonical plaintext: compact JSON in fixed field order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| LockboxError::SerializationError(format!("object {}: {e}", self.rel_path)))
    }

    /// A fresh digest of the canonical plaintext (new salt every call).
    pub fn digest(&self) -> Result<ContentDigest> {
        Ok(ContentDigest::compute(&self.canonical_bytes()?))
    }

    /// Compress and encrypt. Returns the digest alongside the sealed bytes.
    pub fn seal(&self, key: &VaultKey) -> Result<(ContentDigest, Vec<u8>)> {
        let plaintext = self.canonical_bytes()?;
        let digest = ContentDigest::compute(&plaintext);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&plaintext)?;
        let compressed = encoder.finish()?;

        Ok((digest, encrypt(key, &compressed)?))
    }

    /// Decrypt, decompress and parse sealed bytes.
    pub fn open(bytes: &[u8], key: &VaultKey) -> Result<Self> {
        let compressed = decrypt(key, bytes)?;

        let mut plaintext = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut plaintext)
            .map_err(|e| LockboxError::CorruptObject(format!("decompression failed: {e}")))?;

        let object: Self = serde_json::from_slice(&plaintext)
            .map_err(|e| LockboxError::CorruptObject(e.to_string()))?;
        if object.version != OBJECT_VERSION {
            return Err(LockboxError::CorruptObject(format!(
                "unsupported object version {}",
                object.version
            )));
        }
        Ok(object)
    }

    /// `true` if the live file at `abs` still encodes to what `digest` names.
    pub fn matches_current(ctx: &VaultContext, digest: &ContentDigest, abs: &Path) -> Result<bool> {
        let live = Self::from_file(ctx, abs)?;
        Ok(digest.matches(&live.canonical_bytes()?))
    }

    /// Write the payload to `dest` with the recorded permission bits,
    /// creating parent directories.
    pub fn restore(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| LockboxError::io_at(parent, e))?;
        }
        let mut file = create_with_mode(dest, self.permissions)?;
        file.write_all(&self.payload)
            .map_err(|e| LockboxError::io_at(dest, e))?;
        drop(file);
        set_permission_bits(dest, self.permissions)
    }
}

/// Open `path` for writing with `mode` already applied, so the payload is
/// never readable under looser bits.
#[cfg(unix)]
fn create_with_mode(path: &Path, mode: u32) -> Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode & 0o777)
        .open(path)
        .map_err(|e| LockboxError::io_at(path, e))?;
    // An existing file keeps its old bits until told otherwise.
    file.set_permissions(fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| LockboxError::io_at(path, e))?;
    Ok(file)
}

#[cfg(not(unix))]
fn create_with_mode(path: &Path, _mode: u32) -> Result<fs::File> {
    fs::File::create(path).map_err(|e| LockboxError::io_at(path, e))
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn set_permission_bits(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| LockboxError::io_at(path, e))
}

#[cfg(not(unix))]
fn set_permission_bits(path: &Path, mode: u32) -> Result<()> {
    let mut perms = fs::metadata(path)
        .map_err(|e| LockboxError::io_at(path, e))?
        .permissions();
    perms.set_readonly(mode & 0o222 == 0);
    fs::set_permissions(path, perms).map_err(|e| LockboxError::io_at(path, e))
}

fn base64_encode<S: Serializer>(bytes: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&STANDARD_NO_PAD.encode(bytes))
}

fn base64_decode<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<u8>, D::Error> {
    let text = String::deserialize(d)?;
    STANDARD_NO_PAD
        .decode(text.trim_end_matches('='))
        .map_err(serde::de::Error::custom)
}

// ---------------------------------------------------------------------------
// ObjectStore
// ---------------------------------------------------------------------------

/// The `data/` directory: one sealed file per digest.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    data_path: PathBuf,
}

impl ObjectStore {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
        }
    }

    pub fn path_for(&self, digest: &ContentDigest) -> PathBuf {
        self.data_path.join(digest.to_base64())
    }

    pub fn write(&self, digest: &ContentDigest, sealed: &[u8]) -> Result<()> {
        write_atomic(&self.path_for(digest), sealed)
    }

    pub fn read(&self, digest: &ContentDigest) -> Result<Vec<u8>> {
        let path = self.path_for(digest);
        fs::read(&path).map_err(|e| LockboxError::io_at(path, e))
    }

    /// Delete an object. Already gone is fine.
    pub fn remove(&self, digest: &ContentDigest) -> Result<()> {
        let path = self.path_for(digest);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockboxError::io_at(path, e)),
        }
    }
}
