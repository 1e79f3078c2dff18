use thiserror::Error;

/// Errors from configuration, transport, or decoding.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A config, ABI, or address file is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The node could not be reached or the HTTP exchange failed.
    #[error("failed to reach node for {method}: {source}")]
    Transport {
        /// JSON-RPC method being called.
        method: String,
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a JSON-RPC error object.
    #[error("{method} failed with code {code}: {message}")]
    Rpc {
        /// JSON-RPC method being called.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// Returned data did not match the expected ABI layout.
    #[error("failed to decode contract response: {0}")]
    Decode(String),
}
