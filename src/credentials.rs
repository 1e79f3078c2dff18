//! Operator notification credentials and their canonical text form.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A required credential field was left empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The named field is empty.
    #[error("{field} is required")]
    EmptyField {
        /// Human-readable field name.
        field: &'static str,
    },
}

/// Sender account and notification recipient entered at onboarding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    sender_email: String,
    sender_password: String,
    receiver_email: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"[REDACTED]")
            .field("receiver_email", &self.receiver_email)
            .finish()
    }
}

impl Credentials {
    /// Build credentials, rejecting any empty field.
    ///
    /// Fields are checked in entry order: sender email, sender password,
    /// receiver email.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] for the first empty field.
    pub fn new(
        sender_email: impl Into<String>,
        sender_password: impl Into<String>,
        receiver_email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let credentials = Self {
            sender_email: sender_email.into(),
            sender_password: sender_password.into(),
            receiver_email: receiver_email.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Check that every field is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] for the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("sender email", &self.sender_email),
            ("sender password", &self.sender_password),
            ("receiver email", &self.receiver_email),
        ];
        match fields.iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(ValidationError::EmptyField { field: *field }),
            None => Ok(()),
        }
    }

    /// Account that notifications are sent from.
    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    /// Password for the sender account.
    pub fn sender_password(&self) -> &str {
        &self.sender_password
    }

    /// Address that receives detection notifications.
    pub fn receiver_email(&self) -> &str {
        &self.receiver_email
    }

    /// Canonical serialized form that gets sealed.
    ///
    /// # Errors
    ///
    /// Returns an error only if JSON serialization fails.
    pub fn to_canonical(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse the canonical form and re-check field presence.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the bytes are not a valid
    /// credentials document.
    pub fn from_canonical(bytes: &[u8]) -> Result<Self, String> {
        let credentials: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        credentials.validate().map_err(|e| e.to_string())?;
        Ok(credentials)
    }
}
