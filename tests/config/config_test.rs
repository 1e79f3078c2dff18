//! Tests for `src/config.rs`.

use std::path::PathBuf;

use vigil::config::VigilConfig;

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let config = VigilConfig::from_toml(
        r#"
[paths]
key_file = "/var/lib/vigil/encryption.key"

[logging]
json_file = true
"#,
    )
    .expect("parse");
    assert_eq!(
        config.paths.key_file,
        PathBuf::from("/var/lib/vigil/encryption.key")
    );
    assert_eq!(
        config.paths.credentials_file,
        PathBuf::from("email_credentials.enc")
    );
    assert!(config.logging.json_file);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.worker.program, "python");
}

#[test]
fn empty_toml_is_all_defaults() {
    let config = VigilConfig::from_toml("").expect("parse");
    assert_eq!(config.worker.args, vec!["detection_backend.py"]);
    assert!(config.paths.logs_dir.is_none());
    assert!(config.worker.working_dir.is_none());
}

#[test]
fn wrongly_typed_value_is_an_error() {
    let result = VigilConfig::from_toml("[logging]\njson_file = \"yes\"\n");
    assert!(result.is_err());
}

#[test]
fn env_overrides_win_over_file() {
    let mut config = VigilConfig::from_toml("[worker]\nprogram = \"python3\"\n").expect("parse");
    config.apply_overrides(|key| match key {
        "VIGIL_KEY_FILE" => Some("/tmp/k".to_owned()),
        "VIGIL_CREDENTIALS_FILE" => Some("/tmp/c".to_owned()),
        "VIGIL_LOGS_DIR" => Some("/tmp/logs".to_owned()),
        "VIGIL_WORKER_PROGRAM" => Some("/opt/venv/bin/python".to_owned()),
        "VIGIL_LOG_LEVEL" => Some("vigil=debug".to_owned()),
        _ => None,
    });
    assert_eq!(config.paths.key_file, PathBuf::from("/tmp/k"));
    assert_eq!(config.paths.credentials_file, PathBuf::from("/tmp/c"));
    assert_eq!(
        config.paths.resolved_logs_dir().expect("logs dir"),
        PathBuf::from("/tmp/logs")
    );
    assert_eq!(config.worker.program, "/opt/venv/bin/python");
    assert_eq!(config.logging.level, "vigil=debug");
}

#[test]
fn blank_worker_override_is_ignored() {
    let mut config = VigilConfig::default();
    config.apply_overrides(|key| (key == "VIGIL_WORKER_PROGRAM").then(|| "  ".to_owned()));
    assert_eq!(config.worker.program, "python");
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = VigilConfig::load_from_file(&dir.path().join("absent.toml")).expect("load");
    assert_eq!(config.paths.key_file, PathBuf::from("encryption.key"));
}

#[test]
fn invalid_file_reports_its_path() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("vigil.toml");
    std::fs::write(&path, "[paths\n").expect("write");
    let err = VigilConfig::load_from_file(&path).expect_err("invalid toml");
    assert!(format!("{err:#}").contains("vigil.toml"));
}
