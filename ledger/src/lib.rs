//! Vigil ledger — read-only client for the detection audit contract.
//!
//! The detection worker appends `{timestamp, framePath, detections}` entries
//! to an on-chain log. This crate connects to a JSON-RPC node, reads the
//! entry count, and fetches each entry. It shares nothing with the vault or
//! dispatcher beyond the logging setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Contract ABI checks and call-data encoding/decoding.
pub mod abi;
/// Configuration loading.
pub mod config;
/// Error type shared across the crate.
pub mod error;
/// Entry retrieval and rendering.
pub mod reader;
/// Minimal JSON-RPC client.
pub mod rpc;

pub use error::LedgerError;
