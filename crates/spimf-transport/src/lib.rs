#![warn(missing_docs)]
//! # spimf-transport
//!
//! ## Purpose
//! Carries one logical request to the spreadsheet-backed member API.
//!
//! ## Responsibilities
//! - Name the API actions and their HTTP shape ([`ApiAction`]).
//! - Define the injectable [`ApiTransport`] seam.
//! - Provide the production [`HttpTransport`] over `reqwest`.
//! - Classify failures as retriable or permanent for the startup probe.
//! - Compute probe backoff delays from a [`RetryPolicy`].
//!
//! ## Data flow
//! Request controller -> [`ApiTransport::call`] -> HTTP GET (probe) or POST
//! with `{"action": ..., ...payload}` -> raw JSON [`Value`] -> response
//! contract parsing upstream.
//!
//! ## Ownership and lifetimes
//! Payloads are borrowed for the duration of the call; responses are owned
//! JSON values so they survive the network buffer.
//!
//! ## Cancellation
//! Calls are plain futures. Dropping the future aborts the in-flight HTTP
//! request, which is how the request controller enforces its deadline.
//!
//! ## Security and privacy notes
//! Payloads may contain credentials; this crate logs only the action name,
//! status codes and [`request_fingerprint`] digests.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// JSON object fields sent alongside the action name.
pub type Payload = Map<String, Value>;

/// Body key carrying the action name.
pub const ACTION_KEY: &str = "action";

/// Remote API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiAction {
    /// Startup connectivity check.
    Probe,
    /// Member authentication.
    Login,
    /// Profile form save.
    UpdateProfile,
    /// Social media form save.
    UpdateMedia,
    /// Restore the record's previous values.
    RevertData,
    /// Fetch the member's change log.
    GetLogs,
}

/// HTTP verb used for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Bodyless GET.
    Get,
    /// JSON POST.
    Post,
}

impl ApiAction {
    /// Every action, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Probe,
        Self::Login,
        Self::UpdateProfile,
        Self::UpdateMedia,
        Self::RevertData,
        Self::GetLogs,
    ];

    /// Wire name of the action.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Login => "login",
            Self::UpdateProfile => "updateProfile",
            Self::UpdateMedia => "updateMedia",
            Self::RevertData => "revertData",
            Self::GetLogs => "getLogs",
        }
    }

    /// Looks up an action by wire name.
    pub fn from_wire_name(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.wire_name() == raw)
    }

    /// HTTP verb for the action.
    pub fn method(self) -> HttpMethod {
        match self {
            Self::Probe => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }
}

impl fmt::Display for ApiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Abstract transport used by the request controller.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends one request and returns the decoded JSON body.
    ///
    /// # Errors
    /// Returns [`TransportError`] for connection, status or decode failures.
    async fn call(&self, action: ApiAction, payload: &Payload) -> Result<Value, TransportError>;
}

/// Builds the POST body: `action` first, then payload fields.
///
/// A payload key named `action` is ignored so it cannot override the action.
pub fn request_body(action: ApiAction, payload: &Payload) -> Value {
    let mut body = Map::with_capacity(payload.len() + 1);
    body.insert(
        ACTION_KEY.to_string(),
        Value::String(action.wire_name().to_string()),
    );
    for (key, value) in payload {
        if key != ACTION_KEY {
            body.insert(key.clone(), value.clone());
        }
    }
    Value::Object(body)
}

/// Stable digest of an action and payload for log correlation.
pub fn request_fingerprint(action: ApiAction, payload: &Payload) -> String {
    let body = request_body(action, payload);
    let digest = Sha256::digest(body.to_string().as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(16);
    encoded
}

/// Production transport against a single configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport for an already validated endpoint.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidRequest`] when the HTTP client cannot
    /// be constructed.
    pub fn new(endpoint: Url) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("spimf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| TransportError::InvalidRequest(error.to_string()))?;
        Ok(Self { endpoint, client })
    }

    /// Configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn call(&self, action: ApiAction, payload: &Payload) -> Result<Value, TransportError> {
        let request = match action.method() {
            HttpMethod::Get => self.client.get(self.endpoint.clone()),
            HttpMethod::Post => self
                .client
                .post(self.endpoint.clone())
                .json(&request_body(action, payload)),
        };

        debug!(%action, fingerprint = %request_fingerprint(action, payload), "sending api request");
        let response = request
            .send()
            .await
            .map_err(|error| TransportError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| TransportError::Decode(error.to_string()))
    }
}

/// Failure class used to decide whether a probe is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Another attempt may succeed.
    Retriable,
    /// Retrying will not help.
    Permanent,
}

/// Classifies a transport failure.
pub fn classify_transport_error(error: &TransportError) -> FailureClass {
    match error {
        TransportError::Network(_) => FailureClass::Retriable,
        TransportError::Status(code) if *code >= 500 || *code == 408 || *code == 429 => {
            FailureClass::Retriable
        }
        TransportError::Status(_) | TransportError::Decode(_) | TransportError::InvalidRequest(_) => {
            FailureClass::Permanent
        }
    }
}

/// Bounded retry policy for the startup connectivity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum probe attempts; zero is treated as one.
    pub max_retries: u32,
    /// First backoff delay.
    pub base_delay_ms: u64,
    /// Backoff ceiling before jitter.
    pub max_delay_ms: u64,
    /// Upper bound of uniformly random extra delay.
    pub jitter_ms: u64,
}

impl RetryPolicy {
    /// Total attempts allowed.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Returns `true` when another attempt may follow `attempt` (1-based).
    pub fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Backoff before the attempt after `attempt` (1-based).
    ///
    /// Doubles from `base_delay_ms`, capped at `max_delay_ms`, plus jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay_ms
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_ms);
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_ms)
        };
        Duration::from_millis(backoff.saturating_add(jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 4_000,
            jitter_ms: 250,
        }
    }
}

/// Transport-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, TLS or I/O failure.
    #[error("network failure: {0}")]
    Network(String),
    /// Server answered with a non-2xx status.
    #[error("http status {0}")]
    Status(u16),
    /// Body was not valid JSON.
    #[error("response decode failure: {0}")]
    Decode(String),
    /// Request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
