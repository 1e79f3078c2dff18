//! Ethereum JSON-RPC over HTTP, limited to the calls the reader needs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::abi::ContractAddress;
use crate::LedgerError;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC client bound to one node endpoint.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: url::Url,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] if the HTTP client cannot be built.
    pub fn new(endpoint: url::Url, timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue one JSON-RPC request and decode its `result`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transport`] on HTTP failure, [`LedgerError::Rpc`]
    /// when the node reports an error, and [`LedgerError::Decode`] when the
    /// result is absent or has the wrong shape.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "sending JSON-RPC request");

        let transport = |source| LedgerError::Transport {
            method: method.to_owned(),
            source,
        };
        let response: RpcResponse<T> = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if let Some(err) = response.error {
            return Err(LedgerError::Rpc {
                method: method.to_owned(),
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| LedgerError::Decode(format!("{method} returned no result")))
    }

    /// Node software version, used as a connectivity check.
    ///
    /// # Errors
    ///
    /// Returns any error from [`RpcClient::call`].
    pub async fn client_version(&self) -> Result<String, LedgerError> {
        self.call("web3_clientVersion", json!([])).await
    }

    /// Read-only contract call against the latest block.
    ///
    /// # Errors
    ///
    /// Returns any error from [`RpcClient::call`], or [`LedgerError::Decode`]
    /// when the result is not hex.
    pub async fn eth_call(
        &self,
        to: &ContractAddress,
        data: &[u8],
    ) -> Result<Vec<u8>, LedgerError> {
        let params = json!([
            { "to": to.as_str(), "data": format!("0x{}", hex::encode(data)) },
            "latest",
        ]);
        let result: String = self.call("eth_call", params).await?;
        decode_hex(&result)
    }
}

/// Decode a `0x`-prefixed hex string.
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] when the input is not valid hex.
pub fn decode_hex(raw: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| LedgerError::Decode(format!("invalid hex {raw:?}: {e}")))
}
