//! Lifecycle of the single symmetric key that seals operator credentials.
//!
//! The key is created once, persisted as raw bytes, and reloaded on every
//! start. It is never rotated: replacing the key file after credentials were
//! sealed makes those credentials permanently unreadable, and callers are
//! expected to re-onboard rather than paper over it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::files::write_private_new;

/// Length in bytes of an AES-256-GCM key.
pub const KEY_LEN: usize = 32;

/// Errors raised while loading or creating the key file.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file exists but could not be read.
    #[error("failed to read key file {}: {detail}", path.display())]
    Read {
        /// Key file location.
        path: PathBuf,
        /// Underlying I/O error.
        detail: String,
    },

    /// The key file exists but does not hold a key of the expected length.
    #[error("key file {} holds {found} bytes, expected {KEY_LEN}", path.display())]
    InvalidLength {
        /// Key file location.
        path: PathBuf,
        /// Number of bytes found.
        found: usize,
    },

    /// A freshly generated key could not be persisted.
    #[error("failed to write key file {}: {detail}", path.display())]
    Write {
        /// Key file location.
        path: PathBuf,
        /// Underlying I/O error.
        detail: String,
    },
}

impl KeyError {
    /// Key errors are filesystem failures and are never retried.
    pub fn is_recoverable(&self) -> bool {
        false
    }
}

/// Raw symmetric key material. Zeroed when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a key from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Build a key from raw bytes. Returns `None` unless exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Expose the raw key bytes for cipher construction.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Owns the key file at a configured location.
#[derive(Debug, Clone)]
pub struct KeyManager {
    path: PathBuf,
}

impl KeyManager {
    /// Create a manager for the key file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a key file is already present.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the key if the file exists, otherwise generate and persist one.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Read`] or [`KeyError::InvalidLength`] when an
    /// existing file cannot be used, and [`KeyError::Write`] when a new key
    /// cannot be stored. An unusable existing file is never overwritten.
    pub fn load_or_create(&self) -> Result<EncryptionKey, KeyError> {
        match self.read()? {
            Some(key) => {
                debug!(path = %self.path.display(), "loaded encryption key");
                Ok(key)
            }
            None => self.create(),
        }
    }

    /// Read the key file; `None` when it does not exist.
    fn read(&self) -> Result<Option<EncryptionKey>, KeyError> {
        let mut bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeyError::Read {
                    path: self.path.clone(),
                    detail: e.to_string(),
                })
            }
        };
        let key = EncryptionKey::from_slice(&bytes);
        let found = bytes.len();
        bytes.zeroize();
        key.map(Some).ok_or_else(|| KeyError::InvalidLength {
            path: self.path.clone(),
            found,
        })
    }

    /// Generate and publish a key without ever replacing an existing file.
    ///
    /// If another process published a key first, that key is loaded instead.
    fn create(&self) -> Result<EncryptionKey, KeyError> {
        let key = EncryptionKey::generate();
        let created = write_private_new(&self.path, key.as_bytes()).map_err(|e| KeyError::Write {
            path: self.path.clone(),
            detail: format!("{e:#}"),
        })?;
        if created {
            info!(path = %self.path.display(), "generated new encryption key");
            return Ok(key);
        }

        debug!(path = %self.path.display(), "key file appeared concurrently, loading it");
        self.read()?.ok_or_else(|| KeyError::Read {
            path: self.path.clone(),
            detail: "key file vanished after creation".to_owned(),
        })
    }
}
