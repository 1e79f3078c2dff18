//! One operator session: key, vault, selection, and dispatch wired together.

use thiserror::Error;
use tracing::info;

use crate::catalog::ModelCatalog;
use crate::config::VigilConfig;
use crate::credentials::Credentials;
use crate::dispatch::{DispatchError, JobDispatcher, ProcessLauncher, WorkerHandle, WorkerLauncher};
use crate::input::InputSource;
use crate::keys::{KeyError, KeyManager};
use crate::selection::ModelSelectionRegistry;
use crate::vault::{CredentialSource, CredentialVault, VaultError};

/// Which screen a session starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No credential file yet: collect, seal, and persist credentials.
    Onboarding,
    /// Credentials are stored: go straight to model selection and dispatch.
    Dashboard,
}

/// Errors surfaced by console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The key could not be loaded or created.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Credentials could not be stored or opened.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// A dispatch request was refused or the worker failed to start.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Onboarding was attempted over existing credentials without `force`.
    #[error("credentials already stored at {0}; pass --force to replace them")]
    AlreadyOnboarded(String),
}

impl ConsoleError {
    /// Whether the operator can retry after correcting input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Key(e) => e.is_recoverable(),
            Self::Vault(e) => e.is_recoverable(),
            Self::Dispatch(e) => e.is_recoverable(),
            Self::AlreadyOnboarded(_) => true,
        }
    }
}

/// Interactive session state.
#[derive(Debug)]
pub struct Console<L = ProcessLauncher> {
    vault: CredentialVault,
    registry: ModelSelectionRegistry,
    dispatcher: JobDispatcher<L>,
}

impl Console<ProcessLauncher> {
    /// Load or create the key and bind the vault and worker from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Key`] when the key file is unusable.
    pub fn open(config: &VigilConfig) -> Result<Self, ConsoleError> {
        Self::with_launcher(config, ProcessLauncher::from_config(&config.worker))
    }
}

impl<L: WorkerLauncher> Console<L> {
    /// Like [`Console::open`] with a caller-supplied launcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Key`] when the key file is unusable.
    pub fn with_launcher(config: &VigilConfig, launcher: L) -> Result<Self, ConsoleError> {
        let key = KeyManager::new(&config.paths.key_file).load_or_create()?;
        let catalog = ModelCatalog::default();
        Ok(Self {
            vault: CredentialVault::new(&config.paths.credentials_file, key),
            registry: ModelSelectionRegistry::new(catalog),
            dispatcher: JobDispatcher::new(catalog, launcher),
        })
    }

    /// Screen to show on startup.
    pub fn screen(&self) -> Screen {
        if self.vault.is_onboarded() {
            Screen::Dashboard
        } else {
            Screen::Onboarding
        }
    }

    /// Seal and persist credentials collected at onboarding.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AlreadyOnboarded`] when credentials exist and
    /// `force` is false, or the vault's error when sealing or writing fails.
    pub fn onboard(&self, credentials: Credentials, force: bool) -> Result<(), ConsoleError> {
        if self.vault.is_onboarded() && !force {
            return Err(ConsoleError::AlreadyOnboarded(
                self.vault.path().display().to_string(),
            ));
        }
        self.vault.store(&credentials)?;
        drop(credentials);
        info!("onboarding complete");
        Ok(())
    }

    /// Open the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns the vault's error when credentials are absent or unreadable.
    pub fn credentials(&self) -> Result<Credentials, ConsoleError> {
        Ok(self.vault.load()?)
    }

    /// The credential vault.
    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Model selection for this session.
    pub fn registry(&self) -> &ModelSelectionRegistry {
        &self.registry
    }

    /// Mutable model selection for this session.
    pub fn registry_mut(&mut self) -> &mut ModelSelectionRegistry {
        &mut self.registry
    }

    /// The dispatcher used by [`Console::dispatch`].
    pub fn dispatcher(&self) -> &JobDispatcher<L> {
        &self.dispatcher
    }

    /// Dispatch the current selection from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Dispatch`] for any refused or failed launch.
    pub fn dispatch(&self, input: &InputSource, notify: bool) -> Result<WorkerHandle, ConsoleError> {
        Ok(self
            .dispatcher
            .dispatch(input, self.registry.selected(), notify, &self.vault)?)
    }
}
