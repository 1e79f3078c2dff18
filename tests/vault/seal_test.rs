//! Sealing, opening, and tamper detection.

use std::fs;

use vigil::credentials::{Credentials, ValidationError};
use vigil::keys::EncryptionKey;
use vigil::vault::{open, seal, CredentialSource, CredentialVault, VaultError};

fn samples() -> Vec<Credentials> {
    vec![
        Credentials::new("a@x.com", "pw", "b@x.com").expect("valid"),
        Credentials::new("ops@example.org", "pässwörd \"quoted\" \\ 🔒", "alerts@example.org")
            .expect("valid"),
        Credentials::new("s", &"x".repeat(4096), "r").expect("valid"),
    ]
}

#[test]
fn open_inverts_seal() {
    let key = EncryptionKey::generate();
    for credentials in samples() {
        let sealed = seal(&credentials, &key).expect("seal");
        assert_eq!(open(sealed.as_bytes(), &key).expect("open"), credentials);
    }
}

#[test]
fn other_key_fails_authentication() {
    let sealing_key = EncryptionKey::generate();
    let other_key = EncryptionKey::generate();
    for credentials in samples() {
        let sealed = seal(&credentials, &sealing_key).expect("seal");
        let err = open(sealed.as_bytes(), &other_key).expect_err("wrong key");
        assert!(matches!(err, VaultError::Authentication { .. }), "got {err:?}");
        assert!(!err.is_recoverable());
    }
}

#[test]
fn any_flipped_byte_fails_authentication() {
    let key = EncryptionKey::generate();
    let credentials = Credentials::new("a@x.com", "pw", "b@x.com").expect("valid");
    let sealed = seal(&credentials, &key).expect("seal").into_bytes();

    for index in 0..sealed.len() {
        let mut tampered = sealed.clone();
        tampered[index] ^= 0x01;
        let result = open(&tampered, &key);
        assert!(
            matches!(result, Err(VaultError::Authentication { .. })),
            "byte {index} flip was not detected"
        );
    }
}

#[test]
fn empty_field_rejected_before_encryption() {
    let key = EncryptionKey::generate();
    let parsed: Credentials = serde_json::from_str(
        r#"{"sender_email":"","sender_password":"p","receiver_email":"r"}"#,
    )
    .expect("deserialize bypasses constructor validation");

    let err = seal(&parsed, &key).expect_err("empty sender");
    assert!(matches!(
        err,
        VaultError::Validation(ValidationError::EmptyField {
            field: "sender email"
        })
    ));
    assert!(err.is_recoverable());
}

#[test]
fn stored_file_round_trips_and_holds_no_plaintext() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("email_credentials.enc");
    let key = EncryptionKey::generate();
    let vault = CredentialVault::new(&path, key.clone());
    let credentials = Credentials::new("a@x.com", "s3cret-pw", "b@x.com").expect("valid");

    vault.store(&credentials).expect("store");
    assert!(vault.is_onboarded());

    let on_disk = fs::read(&path).expect("read sealed file");
    let needle = b"s3cret-pw";
    assert!(!on_disk.windows(needle.len()).any(|w| w == needle));

    let reopened = CredentialVault::new(&path, key);
    assert_eq!(reopened.load().expect("load"), credentials);
}

#[test]
fn torn_credential_file_fails_closed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("email_credentials.enc");
    let key = EncryptionKey::generate();
    let vault = CredentialVault::new(&path, key);
    vault
        .store(&Credentials::new("a@x.com", "pw", "b@x.com").expect("valid"))
        .expect("store");

    let full = fs::read(&path).expect("read");
    fs::write(&path, &full[..full.len() / 2]).expect("truncate");

    let err = vault.load().expect_err("torn file");
    assert!(matches!(err, VaultError::Authentication { .. }));
    assert!(err.to_string().contains("re-run onboarding"));
}
