//! Just enough of the Solidity ABI to talk to the detection log contract.
//!
//! The contract exposes:
//! - `getLogCount() returns (uint256)`
//! - `getLog(uint256) returns (uint256 timestamp, string framePath, string detections)`

use serde::Deserialize;

use crate::LedgerError;

/// Selector of `getLogCount()`.
pub const GET_LOG_COUNT_SELECTOR: [u8; 4] = [0x61, 0x80, 0x33, 0xdb];

/// Selector of `getLog(uint256)`.
pub const GET_LOG_SELECTOR: [u8; 4] = [0x32, 0x06, 0xb2, 0xc6];

const WORD: usize = 32;
const FRAME_PATH_HEAD: usize = WORD;
const DETECTIONS_HEAD: usize = 2 * WORD;
const STRUCT_RETURN_MIN_LEN: usize = 5 * WORD;

/// A validated 20-byte contract address, kept in `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Parse an address, tolerating surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Config`] unless the input is `0x` followed by
    /// 40 hex digits.
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| LedgerError::Config(format!("address {trimmed:?} lacks 0x prefix")))?;
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::Config(format!(
                "address {trimmed:?} is not 40 hex digits"
            )));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// Hex form for JSON-RPC params.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: Option<String>,
}

/// Check that an ABI JSON document declares every function in `required`.
///
/// # Errors
///
/// Returns [`LedgerError::Config`] when the JSON is not an ABI array or a
/// function is missing.
pub fn verify_abi(json: &str, required: &[&str]) -> Result<(), LedgerError> {
    let items: Vec<AbiItem> = serde_json::from_str(json)
        .map_err(|e| LedgerError::Config(format!("ABI is not a JSON array of items: {e}")))?;
    for name in required {
        let declared = items
            .iter()
            .any(|item| item.kind == "function" && item.name.as_deref() == Some(*name));
        if !declared {
            return Err(LedgerError::Config(format!(
                "ABI does not declare function {name}"
            )));
        }
    }
    Ok(())
}

/// Call data for `getLogCount()`.
pub fn encode_get_log_count() -> Vec<u8> {
    GET_LOG_COUNT_SELECTOR.to_vec()
}

/// Call data for `getLog(index)`.
pub fn encode_get_log(index: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(GET_LOG_SELECTOR.len().saturating_add(WORD));
    data.extend_from_slice(&GET_LOG_SELECTOR);
    data.extend_from_slice(&[0u8; WORD - 8]);
    data.extend_from_slice(&index.to_be_bytes());
    data
}

/// One decoded ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// UNIX timestamp in seconds.
    pub timestamp: u64,
    /// Path of the saved frame image.
    pub frame_path: String,
    /// Detections, JSON encoded by the worker.
    pub detections: String,
}

fn word(data: &[u8], at: usize) -> Result<&[u8], LedgerError> {
    let end = at
        .checked_add(WORD)
        .ok_or_else(|| LedgerError::Decode("offset overflow".to_owned()))?;
    data.get(at..end)
        .ok_or_else(|| LedgerError::Decode(format!("word at byte {at} is past end of data")))
}

/// Read a `uint256` at `at` that must fit in a `u64`.
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] if the data is short or the value is too large.
pub fn decode_u64(data: &[u8], at: usize) -> Result<u64, LedgerError> {
    let w = word(data, at)?;
    let (high, low) = w.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode(format!(
            "uint256 at byte {at} does not fit in 64 bits"
        )));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(low);
    Ok(u64::from_be_bytes(bytes))
}

fn decode_offset(data: &[u8], at: usize) -> Result<usize, LedgerError> {
    let raw = decode_u64(data, at)?;
    usize::try_from(raw).map_err(|_| LedgerError::Decode(format!("offset {raw} too large")))
}

fn checked(a: usize, b: usize) -> Result<usize, LedgerError> {
    a.checked_add(b)
        .ok_or_else(|| LedgerError::Decode("offset overflow".to_owned()))
}

fn decode_string(data: &[u8], base: usize, head: usize) -> Result<String, LedgerError> {
    let start = checked(base, decode_offset(data, checked(base, head)?)?)?;
    let len = decode_offset(data, start)?;
    let body_start = checked(start, WORD)?;
    let body_end = checked(body_start, len)?;
    let body = data
        .get(body_start..body_end)
        .ok_or_else(|| LedgerError::Decode(format!("string at byte {start} overruns data")))?;
    String::from_utf8(body.to_vec())
        .map_err(|e| LedgerError::Decode(format!("string at byte {start} is not UTF-8: {e}")))
}

/// Decode the return data of `getLog`.
///
/// Accepts both a flat `(uint256, string, string)` return and the same
/// tuple returned as a single struct (leading offset word of `0x20`).
///
/// # Errors
///
/// Returns [`LedgerError::Decode`] when the layout does not match.
pub fn decode_log_record(data: &[u8]) -> Result<LogRecord, LedgerError> {
    let base = if decode_u64(data, 0)? == 32 && data.len() >= STRUCT_RETURN_MIN_LEN {
        WORD
    } else {
        0
    };
    Ok(LogRecord {
        timestamp: decode_u64(data, base)?,
        frame_path: decode_string(data, base, FRAME_PATH_HEAD)?,
        detections: decode_string(data, base, DETECTIONS_HEAD)?,
    })
}
