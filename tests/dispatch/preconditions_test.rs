//! Dispatch precondition ordering and argument composition.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::PathBuf;

use vigil::catalog::ModelCatalog;
use vigil::credentials::Credentials;
use vigil::dispatch::{DispatchError, JobDispatcher, WorkerHandle, WorkerLauncher};
use vigil::input::InputSource;
use vigil::selection::{reduce, SelectionCommand, SelectionSet};
use vigil::vault::{CredentialSource, VaultError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingLauncher {
    calls: RefCell<Vec<Vec<OsString>>>,
}

impl WorkerLauncher for RecordingLauncher {
    fn launch(&self, args: Vec<OsString>) -> Result<WorkerHandle, DispatchError> {
        self.calls.borrow_mut().push(args.clone());
        Ok(WorkerHandle::new(4242, args))
    }
}

struct FailingLauncher;

impl WorkerLauncher for FailingLauncher {
    fn launch(&self, _args: Vec<OsString>) -> Result<WorkerHandle, DispatchError> {
        Err(DispatchError::Launch {
            program: "python".to_owned(),
            detail: "No such file or directory".to_owned(),
        })
    }
}

enum StubVault {
    Stored,
    Tampered,
    Missing,
}

impl CredentialSource for StubVault {
    fn load(&self) -> Result<Credentials, VaultError> {
        match self {
            Self::Stored => Ok(Credentials::new("a@x.com", "pw", "b@x.com").expect("valid")),
            Self::Tampered => Err(VaultError::Authentication {
                context: "wrong key or modified data".to_owned(),
            }),
            Self::Missing => Err(VaultError::Missing {
                path: PathBuf::from("email_credentials.enc"),
            }),
        }
    }
}

fn dispatcher() -> JobDispatcher<RecordingLauncher> {
    JobDispatcher::new(ModelCatalog::default(), RecordingLauncher::default())
}

fn select(names: &[&str]) -> SelectionSet {
    let catalog = ModelCatalog::default();
    names.iter().fold(SelectionSet::default(), |state, name| {
        reduce(&catalog, &state, &SelectionCommand::Toggle((*name).to_owned()))
            .expect("known model")
    })
}

// ---------------------------------------------------------------------------
// Precondition order
// ---------------------------------------------------------------------------

#[test]
fn empty_selection_with_webcam_is_no_model_selected() {
    let err = dispatcher()
        .dispatch(&InputSource::Webcam, &SelectionSet::default(), false, &StubVault::Stored)
        .expect_err("nothing selected");
    assert!(matches!(err, DispatchError::NoModelSelected));
    assert!(err.is_recoverable());
}

#[test]
fn unusable_input_wins_over_empty_selection() {
    let err = dispatcher()
        .dispatch(
            &InputSource::VideoFile(PathBuf::new()),
            &SelectionSet::default(),
            true,
            &StubVault::Tampered,
        )
        .expect_err("no input");
    assert!(matches!(err, DispatchError::NoInputSource));
}

#[test]
fn empty_selection_wins_over_vault_failure() {
    let err = dispatcher()
        .dispatch(&InputSource::Webcam, &SelectionSet::default(), true, &StubVault::Tampered)
        .expect_err("nothing selected");
    assert!(matches!(err, DispatchError::NoModelSelected));
}

#[test]
fn notify_propagates_vault_authentication_error() {
    let d = dispatcher();
    let err = d
        .dispatch(&InputSource::Webcam, &select(&["Shop Lift"]), true, &StubVault::Tampered)
        .expect_err("vault failure");
    assert!(matches!(
        err,
        DispatchError::Vault(VaultError::Authentication { .. })
    ));
    assert!(!err.is_recoverable());
    assert!(d.launcher().calls.borrow().is_empty());
}

#[test]
fn without_notify_a_missing_vault_leaves_receiver_blank() {
    let d = dispatcher();
    let handle = d
        .dispatch(&InputSource::Webcam, &select(&["Shop Lift"]), false, &StubVault::Missing)
        .expect("dispatch");
    assert_eq!(handle.args(), ["Webcam", "False", "", "shoplift.pt"]);
}

// ---------------------------------------------------------------------------
// Argument composition
// ---------------------------------------------------------------------------

#[test]
fn notify_true_passes_receiver_and_flag() {
    let d = dispatcher();
    let handle = d
        .dispatch(&InputSource::Webcam, &select(&["Human Activity"]), true, &StubVault::Stored)
        .expect("dispatch");
    assert_eq!(handle.pid(), 4242);
    assert_eq!(
        d.launcher().calls.borrow().as_slice(),
        [vec!["Webcam", "True", "b@x.com", "yolov8n-pose.pt"]]
    );
}

#[test]
fn notify_false_still_passes_stored_receiver() {
    let d = dispatcher();
    let handle = d
        .dispatch(
            &InputSource::VideoFile(PathBuf::from("/footage/lobby.mp4")),
            &select(&["Fire Accident Detection"]),
            false,
            &StubVault::Stored,
        )
        .expect("dispatch");
    assert_eq!(
        handle.args(),
        ["/footage/lobby.mp4", "False", "b@x.com", "activity_detection.pt"]
    );
}

#[test]
fn artifact_order_ignores_toggle_order() {
    let d = dispatcher();
    let forward = d
        .prepare(
            &InputSource::Webcam,
            &select(&["Weapon Detection", "Shop Lift"]),
            false,
            &StubVault::Stored,
        )
        .expect("prepare");
    let reverse = d
        .prepare(
            &InputSource::Webcam,
            &select(&["Shop Lift", "Weapon Detection"]),
            false,
            &StubVault::Stored,
        )
        .expect("prepare");
    assert_eq!(forward, reverse);
    assert_eq!(
        forward.artifact_paths,
        vec!["shoplift.pt", "weapon_detection.pt"]
    );
}

#[test]
fn launch_failure_is_reported() {
    let d = JobDispatcher::new(ModelCatalog::default(), FailingLauncher);
    let err = d
        .dispatch(&InputSource::Webcam, &select(&["Shop Lift"]), false, &StubVault::Stored)
        .expect_err("spawn failed");
    assert!(matches!(err, DispatchError::Launch { .. }));
    assert!(err.to_string().contains("python"));
}

#[cfg(unix)]
#[test]
fn non_utf8_video_path_reaches_worker_byte_for_byte() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let raw = b"/footage/lobby\xff.mp4";
    let d = dispatcher();
    let handle = d
        .dispatch(
            &InputSource::video(Some(PathBuf::from(OsStr::from_bytes(raw)))),
            &select(&["Shop Lift"]),
            false,
            &StubVault::Stored,
        )
        .expect("dispatch");
    assert_eq!(handle.args()[0].as_bytes(), raw);
    assert_eq!(handle.args()[1..], ["False", "b@x.com", "shoplift.pt"]);
}
