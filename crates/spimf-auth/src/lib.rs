#![warn(missing_docs)]
//! # spimf-auth
//!
//! ## Purpose
//! Implements member credentials, endpoint policy and session lifecycle for
//! `spimf`.
//!
//! ## Responsibilities
//! - Validate the API endpoint policy (absolute HTTPS URL).
//! - Validate login credentials and shape the `login` request payload.
//! - Build a [`Session`] from a successful login response.
//! - Model legal session transitions with [`SessionMachine`].
//!
//! ## Data flow
//! UI collects [`Credentials`] -> [`Credentials::to_login_request`] -> request
//! controller sends `login` -> response `userData` becomes a [`Session`] via
//! [`Session::from_login`] -> [`SessionMachine::on_login_success`].
//!
//! ## Ownership and lifetimes
//! Session fields are owned `String`s so the session outlives the transient
//! response buffer it was parsed from.
//!
//! ## Error model
//! Endpoint policy violations, blank credentials and malformed login payloads
//! are surfaced as [`AuthError`].
//!
//! ## Security and privacy notes
//! Credentials are never logged. [`Credentials::fingerprint`] yields a short
//! one-way digest that log lines may carry instead of the phone number.
//!
//! ## Example
//! ```rust
//! use spimf_auth::{SessionMachine, SessionState};
//!
//! let machine = SessionMachine::new();
//! assert!(matches!(machine.state(), SessionState::Unauthenticated));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Member display name column.
pub const NAME_FIELD: &str = "YOUR NAME";
/// Account status column.
pub const STATUS_FIELD: &str = "STATUS ACCOUNT";
/// Status value of an active account.
pub const ACTIVE_STATUS: &str = "✅AKTIF";
/// Column answering whether the member runs a qualifying social media account.
pub const SOCIAL_MEDIA_FIELD: &str =
    "DO YOU HAVE A SOCIAL MEDIA ACCOUNT AND HAVE MORE THAN 50 FOLLOWERS";
/// Row id key some backends embed inside `userData`.
pub const ROW_FIELD: &str = "row";

const FINGERPRINT_HEX_LEN: usize = 12;

/// Login form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registered phone number.
    pub phone_number: String,
    /// Identity card number.
    pub id_card: String,
    /// Member code.
    pub kode_user: String,
}

impl Credentials {
    /// Validates fields and builds the wire request.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] naming the first blank field.
    pub fn to_login_request(&self) -> Result<LoginRequest, AuthError> {
        for (name, value) in [
            ("phoneNumber", &self.phone_number),
            ("idCard", &self.id_card),
            ("kodeUser", &self.kode_user),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::EmptyCredential(name));
            }
        }

        Ok(LoginRequest {
            phone_number: self.phone_number.trim().to_string(),
            id_card: self.id_card.trim().to_string(),
            kode_user: self.kode_user.trim().to_string(),
        })
    }

    /// Short log-safe digest of the phone number.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.phone_number.trim().as_bytes());
        let mut encoded = hex::encode(digest);
        encoded.truncate(FINGERPRINT_HEX_LEN);
        encoded
    }
}

/// `login` request body fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Registered phone number.
    pub phone_number: String,
    /// Identity card number.
    pub id_card: String,
    /// Member code.
    pub kode_user: String,
}

impl LoginRequest {
    /// Flattens the request into a JSON object payload.
    pub fn into_payload(self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("phoneNumber".to_string(), Value::String(self.phone_number));
        payload.insert("idCard".to_string(), Value::String(self.id_card));
        payload.insert("kodeUser".to_string(), Value::String(self.kode_user));
        payload
    }
}

/// Field name to new value, as submitted by the profile and media forms.
pub type FieldUpdates = BTreeMap<String, String>;

/// Spreadsheet row identifying the member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl RowId {
    /// Reads a row id from a JSON number or numeric string.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().map(Self),
            Value::String(raw) => raw.trim().parse().ok().map(Self),
            _ => None,
        }
    }
}

/// Authenticated member record for the lifetime of one app session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    row: RowId,
    fields: BTreeMap<String, String>,
}

impl Session {
    /// Builds a session from a login response.
    ///
    /// The row id is taken from the top-level `row` when present, otherwise
    /// from `userData.row`.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidResponse`] when no usable row id exists.
    pub fn from_login(user_data: &Map<String, Value>, row: Option<&Value>) -> Result<Self, AuthError> {
        let row = row
            .and_then(RowId::from_json)
            .or_else(|| user_data.get(ROW_FIELD).and_then(RowId::from_json))
            .ok_or_else(|| {
                AuthError::InvalidResponse("login response is missing a row id".to_string())
            })?;

        let fields = user_data
            .iter()
            .filter(|(key, _)| key.as_str() != ROW_FIELD)
            .map(|(key, value)| (key.clone(), field_text(value)))
            .collect();

        Ok(Self { row, fields })
    }

    /// Record row id.
    pub fn row(&self) -> RowId {
        self.row
    }

    /// Field value, if present and non-blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// All fields in name order.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Display name, when recorded.
    pub fn display_name(&self) -> Option<&str> {
        self.field(NAME_FIELD)
    }

    /// Returns `true` when the account status marks the member active.
    pub fn is_account_active(&self) -> bool {
        self.field(STATUS_FIELD) == Some(ACTIVE_STATUS)
    }

    /// Returns `true` when the social media section should be shown.
    pub fn has_social_media(&self) -> bool {
        self.field(SOCIAL_MEDIA_FIELD) == Some("YES")
    }

    /// Merges accepted updates into the record.
    pub fn apply_updates(&mut self, updates: &FieldUpdates) {
        for (key, value) in updates {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Replaces all fields with a server-provided record, keeping the row id.
    pub fn replace_fields(&mut self, user_data: &Map<String, Value>) {
        self.fields = user_data
            .iter()
            .filter(|(key, _)| key.as_str() != ROW_FIELD)
            .map(|(key, value)| (key.clone(), field_text(value)))
            .collect();
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Runtime authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No member is logged in.
    Unauthenticated,
    /// Member session is live.
    Authenticated(Session),
}

/// Session state machine with explicit legal transitions.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// Creates a new state machine in `Unauthenticated` state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauthenticated,
        }
    }

    /// Returns current state snapshot.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Applies login success transition.
    pub fn on_login_success(&mut self, session: Session) {
        self.state = SessionState::Authenticated(session);
    }

    /// Explicit logout transition; the session record is dropped.
    pub fn logout(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    /// Live session, if any.
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }

    /// Mutable live session, if any.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.state {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates the API endpoint policy.
///
/// # Errors
/// Returns [`AuthError::InvalidEndpoint`] for unparseable or non-HTTPS URLs.
pub fn validate_endpoint(endpoint: &str) -> Result<Url, AuthError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| AuthError::InvalidEndpoint(format!("invalid api url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(AuthError::InvalidEndpoint(
            "api endpoint must use https".to_string(),
        ));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AuthError::InvalidEndpoint(
            "api endpoint must name a host".to_string(),
        ));
    }

    Ok(parsed)
}

/// Errors produced by auth validation and session building.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Endpoint violates security or contract requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// A credential field is blank.
    #[error("{0} must be non-empty")]
    EmptyCredential(&'static str),
    /// Login payload violated contract expectations.
    #[error("invalid login response: {0}")]
    InvalidResponse(String),
}
