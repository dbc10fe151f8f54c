use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in Lockbox.
#[derive(Debug, Error)]
pub enum LockboxError {
    // --- Vault resolution errors ---
    #[error("no lockbox vault found at or above {0}")]
    VaultNotFound(PathBuf),

    #[error("cannot initialize vault at {0}: directory already exists")]
    VaultAlreadyExists(PathBuf),

    #[error("{path} is not in the active vault {active}")]
    NotInVault { path: String, active: String },

    #[error("{path} is in vault {other} and not in the active vault {active}")]
    CrossVault {
        path: String,
        other: String,
        active: String,
    },

    // --- Key errors ---
    #[error("{0}")]
    KeyNotFound(String),

    #[error("key already exists, use --force to overwrite")]
    KeyAlreadySet,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    // --- Tracking errors ---
    #[error("{0} cannot be added because it is not in the project directory")]
    OutsideProject(String),

    #[error("{0} cannot be added because it is in the vault directory")]
    InsideVaultDir(String),

    #[error("{0} is already in the vault - use --force or commit to update it instead")]
    AlreadyTracked(String),

    #[error("{0} is not a regular file")]
    NotRegularFile(String),

    #[error("{0} cannot be added because its name contains a line break")]
    UnsupportedPath(String),

    #[error("cannot add {0}: no files match")]
    NoGlobMatches(String),

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{0} has changed - use --force to continue anyway")]
    FileChanged(String),

    // --- Storage format errors ---
    #[error("manifest {} is corrupt at line '{line}'", path.display())]
    ManifestCorrupt { path: PathBuf, line: String },

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("corrupt object: {0}")]
    CorruptObject(String),

    // --- Config errors ---
    #[error("config error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // --- Serialization errors ---
    #[error("serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("not all files were {action} successfully ({} failed)", failures.len())]
    Incomplete {
        action: &'static str,
        failures: Vec<Failure>,
    },
}

impl LockboxError {
    /// Attach the offending path to an IO error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// `true` when the error is an IO "not found", with or without a path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Io(e) | Self::IoAt { source: e, .. } => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// One item of a batch operation that did not go through.
#[derive(Debug)]
pub struct Failure {
    /// The file or input the failure belongs to, as shown to the user.
    pub target: String,
    pub error: LockboxError,
}

impl Failure {
    pub fn new(target: impl Into<String>, error: LockboxError) -> Self {
        Self {
            target: target.into(),
            error,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

/// Convenience type alias for Lockbox results.
pub type Result<T> = std::result::Result<T, LockboxError>;
