//! Fetches ledger entries and renders them for the terminal.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::abi::{self, ContractAddress, LogRecord};
use crate::rpc::RpcClient;
use crate::LedgerError;

/// Reads the detection log contract at a fixed address.
#[derive(Debug)]
pub struct LedgerReader {
    rpc: RpcClient,
    address: ContractAddress,
}

impl LedgerReader {
    /// Bind a reader to `address` through `rpc`.
    pub fn new(rpc: RpcClient, address: ContractAddress) -> Self {
        Self { rpc, address }
    }

    /// Contract being read.
    pub fn address(&self) -> &ContractAddress {
        &self.address
    }

    /// Confirm the node answers, returning its client version.
    ///
    /// # Errors
    ///
    /// Returns the RPC error when the node is unreachable.
    pub async fn check_connection(&self) -> Result<String, LedgerError> {
        self.rpc.client_version().await
    }

    /// Number of entries stored so far. Only ever grows.
    ///
    /// # Errors
    ///
    /// Returns RPC or decode errors.
    pub async fn log_count(&self) -> Result<u64, LedgerError> {
        let data = self
            .rpc
            .eth_call(&self.address, &abi::encode_get_log_count())
            .await?;
        abi::decode_u64(&data, 0)
    }

    /// Entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns RPC or decode errors.
    pub async fn entry(&self, index: u64) -> Result<LogRecord, LedgerError> {
        let data = self
            .rpc
            .eth_call(&self.address, &abi::encode_get_log(index))
            .await?;
        abi::decode_log_record(&data)
    }

    /// Every entry from index 0 up to the current count.
    ///
    /// # Errors
    ///
    /// Stops at the first failing call.
    pub async fn entries(&self) -> Result<Vec<LogRecord>, LedgerError> {
        let count = self.log_count().await?;
        debug!(count, address = %self.address, "reading ledger entries");
        let mut records = Vec::new();
        for index in 0..count {
            records.push(self.entry(index).await?);
        }
        Ok(records)
    }
}

/// UTC time of a record, if the timestamp is representable.
pub fn record_time(record: &LogRecord) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(record.timestamp).ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Multi-line listing of one entry.
pub fn render_record(index: u64, record: &LogRecord) -> String {
    let when = record_time(record)
        .map(|t| format!(" ({})", t.to_rfc3339()))
        .unwrap_or_default();
    format!(
        "Log {index}:\n  Timestamp: {}{when}\n  Frame Path: {}\n  Detections: {}",
        record.timestamp, record.frame_path, record.detections
    )
}
