//! Tests for `src/logging.rs`.

use vigil::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("state").join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber per process; the directory is created
    // before installation, so it exists either way.
    let _result = vigil::logging::init_production(&logs_dir, "vigil.log", "info");
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn init_cli_twice_reports_error() {
    let first = vigil::logging::init_cli("warn");
    let second = vigil::logging::init_cli("warn");
    assert!(first.is_err() || second.is_err());
}
