//! Configuration loading.
//!
//! Loads `vigil.toml` (or `$VIGIL_CONFIG_PATH`). Every section has defaults,
//! so a missing or partial file is valid.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "VIGIL_CONFIG_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Key, credential, and log locations.
    pub paths: PathsConfig,
    /// Detection worker command.
    pub worker: WorkerConfig,
    /// Log filtering and sinks.
    pub logging: LoggingConfig,
}

impl VigilConfig {
    /// Load with precedence: env vars > TOML file > defaults.
    ///
    /// `explicit` (e.g. a `--config` flag) wins over `$VIGIL_CONFIG_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => config_path_with(|key| std::env::var(key).ok()),
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error when the TOML is invalid or has wrongly typed values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: VigilConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Apply environment overrides using `env` as the variable resolver.
    ///
    /// Takes a resolver so tests never have to touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("VIGIL_KEY_FILE") {
            self.paths.key_file = PathBuf::from(v);
        }
        if let Some(v) = env("VIGIL_CREDENTIALS_FILE") {
            self.paths.credentials_file = PathBuf::from(v);
        }
        if let Some(v) = env("VIGIL_LOGS_DIR") {
            self.paths.logs_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("VIGIL_WORKER_PROGRAM") {
            if v.trim().is_empty() {
                tracing::warn!(
                    var = "VIGIL_WORKER_PROGRAM",
                    "ignoring empty env override"
                );
            } else {
                self.worker.program = v;
            }
        }
        if let Some(v) = env("VIGIL_LOG_LEVEL") {
            match tracing_subscriber::EnvFilter::try_new(&v) {
                Ok(_) => self.logging.level = v,
                Err(_) => tracing::warn!(
                    var = "VIGIL_LOG_LEVEL",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }
}

/// Resolve the config file path using a custom env resolver.
///
/// Checks `$VIGIL_CONFIG_PATH` first, then `./vigil.toml`.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
    env(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vigil.toml"))
}

/// Resolve the per-user state directory (`~/.vigil/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".vigil"))
}

// ── Paths config ────────────────────────────────────────────────

/// Locations of persistent state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw encryption key file.
    pub key_file: PathBuf,
    /// Sealed credential file.
    pub credentials_file: PathBuf,
    /// Directory for rotated JSON logs. Defaults to `~/.vigil/logs`.
    pub logs_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("encryption.key"),
            credentials_file: PathBuf::from("email_credentials.enc"),
            logs_dir: None,
        }
    }
}

impl PathsConfig {
    /// Effective logs directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the home
    /// directory cannot be determined.
    pub fn resolved_logs_dir(&self) -> Result<PathBuf> {
        match &self.logs_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("logs")),
        }
    }
}

// ── Worker config ───────────────────────────────────────────────

/// How the detection worker is started.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Executable to run.
    pub program: String,
    /// Arguments placed before the job arguments.
    pub args: Vec<String>,
    /// Working directory for the worker; inherits ours when unset.
    pub working_dir: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "python".to_owned(),
            args: vec!["detection_backend.py".to_owned()],
            working_dir: None,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Log filtering and sinks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Also write daily-rotated JSON logs under the logs directory.
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json_file: false,
        }
    }
}
