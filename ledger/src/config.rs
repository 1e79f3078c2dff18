//! Configuration loading for the ledger reader.
//!
//! Loads `ledger.toml` (or `$VIGIL_LEDGER_CONFIG`). All fields have
//! defaults, so a missing or empty file is valid.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::abi::ContractAddress;
use crate::LedgerError;

/// Ledger reader configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Contract ABI JSON file.
    pub abi_file: PathBuf,
    /// File holding the contract address.
    pub address_file: PathBuf,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            abi_file: PathBuf::from("detetion.abi"),
            address_file: PathBuf::from("detection.address"),
            request_timeout_secs: 30,
        }
    }
}

impl LedgerConfig {
    /// Load from `path`, then apply env overrides. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to read ledger config at {}: {e}",
                    path.display()
                ))
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `VIGIL_LEDGER_*` overrides through `env`.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("VIGIL_LEDGER_RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = env("VIGIL_LEDGER_ABI_FILE") {
            self.abi_file = PathBuf::from(v);
        }
        if let Some(v) = env("VIGIL_LEDGER_ADDRESS_FILE") {
            self.address_file = PathBuf::from(v);
        }
        if let Some(v) = env("VIGIL_LEDGER_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.request_timeout_secs = n,
                Err(_) => tracing::warn!(
                    var = "VIGIL_LEDGER_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }

    /// Parse and validate the RPC endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] unless the URL is http or https.
    pub fn endpoint(&self) -> Result<url::Url, LedgerError> {
        let url = url::Url::parse(&self.rpc_url)
            .map_err(|e| LedgerError::Config(format!("invalid rpc_url {:?}: {e}", self.rpc_url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(LedgerError::Config(format!(
                "rpc_url scheme must be http or https, got {other}"
            ))),
        }
    }

    /// Read and validate the contract address file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] when the file is unreadable or invalid.
    pub fn contract_address(&self) -> Result<ContractAddress, LedgerError> {
        let raw = std::fs::read_to_string(&self.address_file).map_err(|e| {
            LedgerError::Config(format!(
                "failed to read contract address {}: {e}",
                self.address_file.display()
            ))
        })?;
        ContractAddress::parse(&raw)
    }

    /// Read the ABI file and make sure it declares the reader's functions.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] when the file is unreadable or lacks
    /// `getLogCount`/`getLog`.
    pub fn verify_abi(&self) -> Result<(), LedgerError> {
        let json = std::fs::read_to_string(&self.abi_file).map_err(|e| {
            LedgerError::Config(format!(
                "failed to read contract ABI {}: {e}",
                self.abi_file.display()
            ))
        })?;
        crate::abi::verify_abi(&json, &["getLogCount", "getLog"])
    }
}
