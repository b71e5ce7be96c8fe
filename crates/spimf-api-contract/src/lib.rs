#![warn(missing_docs)]
//! # spimf-api-contract
//!
//! ## Purpose
//! Defines the member API response contract and client-side acceptance rules.
//!
//! ## Responsibilities
//! - Decode the loosely shaped JSON returned by every action.
//! - Decide, per action, whether a response is accepted or rejected.
//! - Preserve server rejection messages verbatim, including the `banned` flag.
//!
//! ## Data flow
//! Raw JSON [`Value`] from the transport -> [`evaluate_response`] ->
//! [`ResponseVerdict`] -> request outcome and UI notice upstream.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs so they outlive the transport buffer.
//!
//! ## Error model
//! Undecodable bodies and accepted responses missing mandatory fields return
//! [`ContractError`]. Server-side refusals are not errors here: they are
//! [`ResponseVerdict::Rejected`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use spimf_transport::ApiAction;
use thiserror::Error;

/// Message used when the server rejects a request without explaining why.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Request was rejected by the server";

/// Message used when the probe answers without confirming connectivity.
pub const PROBE_UNREACHABLE_MESSAGE: &str = "System is not reachable. Please try again.";

/// Decoded API response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// Action-level success flag.
    #[serde(default)]
    pub success: bool,
    /// Probe connectivity flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
    /// User-facing message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Member record returned by `login` and `revertData`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<Map<String, Value>>,
    /// Spreadsheet row id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Value>,
    /// Account suspension flag on login refusal.
    #[serde(default)]
    pub banned: bool,
    /// Change log entries returned by `getLogs`.
    #[serde(default)]
    pub logs: Vec<Value>,
}

impl ApiResponse {
    /// Log entries rendered as display lines.
    pub fn log_lines(&self) -> Vec<String> {
        self.logs
            .iter()
            .map(|entry| match entry {
                Value::String(line) => line.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// Client-side decision about a well-formed response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseVerdict {
    /// The action succeeded.
    Accepted(ApiResponse),
    /// The server refused the action.
    Rejected {
        /// Server message, verbatim when present.
        message: String,
        /// Whether the refusal is an account ban.
        banned: bool,
    },
}

/// Decodes a raw response body.
///
/// # Errors
/// Returns [`ContractError::Decode`] when the body is not a JSON object of the
/// expected shape.
pub fn parse_api_response(raw: Value) -> Result<ApiResponse, ContractError> {
    serde_json::from_value(raw).map_err(ContractError::Decode)
}

/// Decodes and judges a response for `action`.
///
/// - `probe` is accepted on `connected: true` or `success: true`.
/// - Other actions are accepted on `success: true`; an accepted `login` must
///   carry a `userData` object.
///
/// # Errors
/// Returns [`ContractError`] for undecodable bodies or accepted responses that
/// miss mandatory fields.
pub fn evaluate_response(action: ApiAction, raw: Value) -> Result<ResponseVerdict, ContractError> {
    let response = parse_api_response(raw)?;

    if action == ApiAction::Probe {
        if response.connected == Some(true) || response.success {
            return Ok(ResponseVerdict::Accepted(response));
        }
        return Ok(ResponseVerdict::Rejected {
            message: response
                .message
                .unwrap_or_else(|| PROBE_UNREACHABLE_MESSAGE.to_string()),
            banned: false,
        });
    }

    if !response.success {
        return Ok(ResponseVerdict::Rejected {
            message: response
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string()),
            banned: response.banned,
        });
    }

    if action == ApiAction::Login && response.user_data.is_none() {
        return Err(ContractError::InvalidContract(
            "accepted login is missing userData".to_string(),
        ));
    }

    Ok(ResponseVerdict::Accepted(response))
}

/// Response contract errors.
#[derive(Debug, Error)]
pub enum ContractError {
    /// JSON decode failure.
    #[error("response decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("response contract violation: {0}")]
    InvalidContract(String),
}
