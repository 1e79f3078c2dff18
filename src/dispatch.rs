//! Validation, job composition, and launch of the detection worker.
//!
//! Launch is fire-and-forget: [`JobDispatcher::dispatch`] returns as soon as
//! the worker process exists. The worker is never waited on, restarted, or
//! read from; the only failure this side can observe is a failed spawn.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{ModelCatalog, UnknownModelError};
use crate::config::WorkerConfig;
use crate::input::InputSource;
use crate::selection::{resolve_artifact_paths, SelectionSet};
use crate::vault::{CredentialSource, VaultError};

/// Worker flag value when notifications are enabled.
pub const NOTIFY_TRUE: &str = "True";

/// Worker flag value when notifications are disabled.
pub const NOTIFY_FALSE: &str = "False";

/// Reasons a dispatch was refused or failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Video input was chosen without a file.
    #[error("no input source selected; choose the webcam or a video file")]
    NoInputSource,

    /// The selection set is empty.
    #[error("no models selected; select at least one detection model")]
    NoModelSelected,

    /// Notification was requested but stored credentials could not be opened.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The selection referenced a model outside the catalog.
    #[error(transparent)]
    UnknownModel(#[from] UnknownModelError),

    /// The worker process could not be started.
    #[error("failed to launch detection worker {program}: {detail}")]
    Launch {
        /// Program that was executed.
        program: String,
        /// Spawn error detail.
        detail: String,
    },
}

impl DispatchError {
    /// Whether the operator can fix this by changing their selection.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NoInputSource | Self::NoModelSelected => true,
            Self::Vault(e) => e.is_recoverable(),
            Self::UnknownModel(_) | Self::Launch { .. } => false,
        }
    }
}

/// Fully resolved parameters for one worker run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    /// Frame source.
    pub input: InputSource,
    /// Whether the worker should send notification emails.
    pub notify: bool,
    /// Notification recipient (empty when unavailable and not notifying).
    pub receiver_email: String,
    /// Model artifacts in catalog order.
    pub artifact_paths: Vec<String>,
}

impl JobSpec {
    /// Positional worker arguments:
    /// `[input, "True"|"False", receiver, artifact...]`.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.artifact_paths.len().saturating_add(3));
        args.push(self.input.token());
        args.push(OsString::from(if self.notify { NOTIFY_TRUE } else { NOTIFY_FALSE }));
        args.push(OsString::from(&self.receiver_email));
        args.extend(self.artifact_paths.iter().map(OsString::from));
        args
    }
}

/// Handle to a launched worker. Dropping it does not stop the worker.
#[derive(Debug)]
pub struct WorkerHandle {
    pid: u32,
    args: Vec<OsString>,
    child: Option<Child>,
}

impl WorkerHandle {
    /// Handle for a worker that is not backed by a local child process.
    pub fn new(pid: u32, args: Vec<OsString>) -> Self {
        Self {
            pid,
            args,
            child: None,
        }
    }

    fn from_child(child: Child, args: Vec<OsString>) -> Self {
        Self {
            pid: child.id(),
            args,
            child: Some(child),
        }
    }

    /// Operating system process id.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Job-spec arguments the worker received.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Release the underlying child handle, if any.
    pub fn into_child(self) -> Option<Child> {
        self.child
    }
}

/// Starts the worker process for a composed argument list.
pub trait WorkerLauncher {
    /// Start the worker with `args` and return without waiting on it.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Launch`] when the process cannot be started.
    fn launch(&self, args: Vec<OsString>) -> Result<WorkerHandle, DispatchError>;
}

/// Launches the configured worker command as a detached child process.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: String,
    prefix_args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessLauncher {
    /// Build a launcher from worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            program: config.program.clone(),
            prefix_args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&self, args: Vec<OsString>) -> Result<WorkerHandle, DispatchError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| DispatchError::Launch {
            program: self.program.clone(),
            detail: e.to_string(),
        })?;
        Ok(WorkerHandle::from_child(child, args))
    }
}

/// Validates dispatch requests and hands them to a [`WorkerLauncher`].
#[derive(Debug)]
pub struct JobDispatcher<L = ProcessLauncher> {
    catalog: ModelCatalog,
    launcher: L,
}

impl<L: WorkerLauncher> JobDispatcher<L> {
    /// Create a dispatcher over `catalog` using `launcher`.
    pub fn new(catalog: ModelCatalog, launcher: L) -> Self {
        Self { catalog, launcher }
    }

    /// The launcher in use.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Check preconditions and compose the job without launching it.
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// usable input, non-empty selection, then (only when `notify` is set)
    /// readable credentials.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoInputSource`], [`DispatchError::NoModelSelected`],
    /// or the vault's error when notification credentials cannot be opened.
    pub fn prepare(
        &self,
        input: &InputSource,
        selection: &SelectionSet,
        notify: bool,
        vault: &dyn CredentialSource,
    ) -> Result<JobSpec, DispatchError> {
        if !input.is_usable() {
            return Err(DispatchError::NoInputSource);
        }
        if selection.is_empty() {
            return Err(DispatchError::NoModelSelected);
        }

        let receiver_email = if notify {
            vault.load()?.receiver_email().to_owned()
        } else {
            // The worker always takes a receiver slot; fill it if we can.
            match vault.load() {
                Ok(credentials) => credentials.receiver_email().to_owned(),
                Err(e) => {
                    debug!(error = %e, "credentials unavailable, notifications are off");
                    String::new()
                }
            }
        };

        let artifact_paths = resolve_artifact_paths(&self.catalog, selection)?;
        Ok(JobSpec {
            input: input.clone(),
            notify,
            receiver_email,
            artifact_paths,
        })
    }

    /// Validate, compose, and launch a detection job.
    ///
    /// Returns once the worker has been spawned; completion is never awaited.
    ///
    /// # Errors
    ///
    /// Returns any precondition error from [`JobDispatcher::prepare`], or
    /// [`DispatchError::Launch`] when the worker cannot be started.
    pub fn dispatch(
        &self,
        input: &InputSource,
        selection: &SelectionSet,
        notify: bool,
        vault: &dyn CredentialSource,
    ) -> Result<WorkerHandle, DispatchError> {
        let job = self.prepare(input, selection, notify, vault)?;
        let handle = self.launcher.launch(job.to_args())?;
        info!(
            pid = handle.pid(),
            input = ?job.input.token(),
            notify = job.notify,
            models = job.artifact_paths.len(),
            "detection worker launched"
        );
        Ok(handle)
    }
}
