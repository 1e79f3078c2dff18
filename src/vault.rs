//! Sealing and opening of operator credentials.
//!
//! Credentials are serialized to their canonical JSON form and encrypted
//! with AES-256-GCM under a fresh random nonce per call. The sealed layout is
//! `nonce || ciphertext || tag`; it is the only form ever written to disk.
//! A wrong key, a modified byte, or a truncated file all fail authentication.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::credentials::{Credentials, ValidationError};
use crate::files::write_private_atomic;
use crate::keys::EncryptionKey;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

const MIN_SEALED_LEN: usize = NONCE_LEN + TAG_LEN;

/// Errors from sealing, opening, or persisting credentials.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Input credentials were incomplete; nothing was encrypted.
    #[error("invalid credentials: {0}")]
    Validation(#[from] ValidationError),

    /// The sealed data was produced under another key, modified, or truncated.
    #[error("stored credentials failed authentication ({context}); re-run onboarding")]
    Authentication {
        /// What was being opened.
        context: String,
    },

    /// Decryption succeeded but the payload is not a credentials document.
    #[error("stored credentials are malformed ({detail}); re-run onboarding")]
    Format {
        /// Parse failure detail.
        detail: String,
    },

    /// Credentials could not be encoded or encrypted; nothing was written.
    #[error("failed to seal credentials: {detail}")]
    Seal {
        /// Encoder or cipher failure detail.
        detail: String,
    },

    /// No credential file exists yet.
    #[error("no stored credentials at {}; run onboarding first", path.display())]
    Missing {
        /// Expected credential file location.
        path: PathBuf,
    },

    /// The credential file could not be read or written.
    #[error("failed to access credential file {}: {detail}", path.display())]
    Io {
        /// Credential file location.
        path: PathBuf,
        /// Underlying I/O error.
        detail: String,
    },
}

impl VaultError {
    /// Only bad operator input can be fixed by re-prompting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Missing { .. })
    }
}

/// Authenticated ciphertext of a [`Credentials`] document.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedCredentials(Vec<u8>);

impl SealedCredentials {
    /// Sealed bytes as stored on disk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for SealedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SealedCredentials")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

fn cipher_for(key: &EncryptionKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seal credentials under `key`.
///
/// Validation runs before any cryptographic work. Every call uses a fresh
/// nonce, so sealing the same credentials twice yields different bytes.
///
/// # Errors
///
/// Returns [`VaultError::Validation`] when a field is empty, and
/// [`VaultError::Seal`] when encoding or encryption fails.
pub fn seal(credentials: &Credentials, key: &EncryptionKey) -> Result<SealedCredentials, VaultError> {
    credentials.validate()?;

    let plaintext = Zeroizing::new(credentials.to_canonical().map_err(|e| VaultError::Seal {
        detail: format!("cannot encode credentials: {e}"),
    })?);

    let cipher = cipher_for(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|_| VaultError::Seal {
            detail: "cipher rejected plaintext".to_owned(),
        })?;

    let mut sealed = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(SealedCredentials(sealed))
}

/// Open sealed bytes with `key`.
///
/// # Errors
///
/// Returns [`VaultError::Authentication`] for a wrong key or any modification
/// (including truncation), and [`VaultError::Format`] when the decrypted
/// payload is not a valid credentials document.
pub fn open(sealed: &[u8], key: &EncryptionKey) -> Result<Credentials, VaultError> {
    if sealed.len() < MIN_SEALED_LEN {
        return Err(VaultError::Authentication {
            context: format!("sealed data is {} bytes, too short", sealed.len()),
        });
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = cipher_for(key);
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::Authentication {
                context: "wrong key or modified data".to_owned(),
            })?,
    );

    Credentials::from_canonical(&plaintext).map_err(|detail| VaultError::Format { detail })
}

/// Anything that can produce the operator's stored credentials.
pub trait CredentialSource {
    /// Open and return the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`VaultError`] when credentials are absent or cannot be opened.
    fn load(&self) -> Result<Credentials, VaultError>;
}

/// Credential file bound to the process key.
#[derive(Debug)]
pub struct CredentialVault {
    path: PathBuf,
    key: EncryptionKey,
}

impl CredentialVault {
    /// Create a vault over the credential file at `path`.
    pub fn new(path: impl Into<PathBuf>, key: EncryptionKey) -> Self {
        Self {
            path: path.into(),
            key,
        }
    }

    /// Location of the sealed credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether onboarding has already produced a credential file.
    pub fn is_onboarded(&self) -> bool {
        self.path.exists()
    }

    /// Seal `credentials` and atomically replace the credential file.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Validation`] for incomplete input, or
    /// [`VaultError::Io`] when the file cannot be written.
    pub fn store(&self, credentials: &Credentials) -> Result<(), VaultError> {
        let sealed = seal(credentials, &self.key)?;
        write_private_atomic(&self.path, sealed.as_bytes()).map_err(|e| VaultError::Io {
            path: self.path.clone(),
            detail: format!("{e:#}"),
        })?;
        info!(path = %self.path.display(), "credentials sealed and saved");
        Ok(())
    }
}

impl CredentialSource for CredentialVault {
    fn load(&self) -> Result<Credentials, VaultError> {
        let sealed = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(e) => {
                return Err(VaultError::Io {
                    path: self.path.clone(),
                    detail: e.to_string(),
                })
            }
        };

        let credentials = open(&sealed, &self.key).map_err(|e| match e {
            VaultError::Authentication { .. } => VaultError::Authentication {
                context: format!("{}: wrong key or modified data", self.path.display()),
            },
            other => other,
        })?;
        debug!(path = %self.path.display(), "credentials opened");
        Ok(credentials)
    }
}
