//! Key file lifecycle.

use std::fs;

use vigil::credentials::Credentials;
use vigil::keys::{KeyError, KeyManager, KEY_LEN};
use vigil::vault::{CredentialSource, CredentialVault, VaultError};

#[test]
fn key_file_is_raw_fixed_length_bytes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manager = KeyManager::new(dir.path().join("encryption.key"));
    manager.load_or_create().expect("create");

    let bytes = fs::read(manager.path()).expect("read key");
    assert_eq!(bytes.len(), KEY_LEN);
}

#[cfg(unix)]
#[test]
fn key_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("temp dir");
    let manager = KeyManager::new(dir.path().join("encryption.key"));
    manager.load_or_create().expect("create");

    let mode = fs::metadata(manager.path())
        .expect("metadata")
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().expect("temp dir");
    let manager = KeyManager::new(dir.path().join("state/keys/encryption.key"));
    manager.load_or_create().expect("create");
    assert!(manager.exists());
}

#[cfg(unix)]
#[test]
fn uncreatable_parent_is_write_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    // Reads through the dangling link see "not found", but the directory
    // cannot be created because the link itself occupies the name.
    let parent = dir.path().join("state");
    std::os::unix::fs::symlink(dir.path().join("gone"), &parent).expect("symlink");

    let manager = KeyManager::new(parent.join("encryption.key"));
    let err = manager.load_or_create().expect_err("parent cannot be created");
    assert!(matches!(err, KeyError::Write { .. }), "got {err:?}");
    assert!(!err.is_recoverable());
}

#[test]
fn file_in_place_of_parent_is_not_replaced() {
    let dir = tempfile::tempdir().expect("temp dir");
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"file").expect("create blocker");

    let manager = KeyManager::new(blocker.join("encryption.key"));
    let err = manager.load_or_create().expect_err("parent is a file");
    assert!(!err.is_recoverable());
    assert_eq!(fs::read(&blocker).expect("read blocker"), b"file");
}

#[test]
fn regenerated_key_cannot_open_old_credentials() {
    let dir = tempfile::tempdir().expect("temp dir");
    let key_path = dir.path().join("encryption.key");
    let creds_path = dir.path().join("email_credentials.enc");

    let original = KeyManager::new(&key_path).load_or_create().expect("create");
    CredentialVault::new(&creds_path, original)
        .store(&Credentials::new("a@x.com", "pw", "b@x.com").expect("valid"))
        .expect("store");

    fs::remove_file(&key_path).expect("remove key");
    let replacement = KeyManager::new(&key_path).load_or_create().expect("recreate");

    let err = CredentialVault::new(&creds_path, replacement)
        .load()
        .expect_err("old credentials are gone");
    assert!(matches!(err, VaultError::Authentication { .. }));
}
