//! Runtime configuration.
//!
//! Layering: built-in defaults, then an optional JSON file named by
//! `SPIMF_CONFIG`, then individual `SPIMF_*` environment overrides. The
//! result is validated once before the controller is built.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spimf_auth::{AuthError, validate_endpoint};
use spimf_core::{CoreError, OperatingSchedule};
use spimf_transport::{ApiAction, RetryPolicy};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Env var naming an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "SPIMF_CONFIG";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Single API endpoint; must be HTTPS.
    pub endpoint_url: String,
    /// Daily operating windows.
    pub operating_hours: OperatingSchedule,
    /// Hard deadline for user-initiated actions.
    pub timeout_ms: u64,
    /// Hard deadline for each startup probe attempt.
    pub probe_timeout_ms: u64,
    /// Maximum startup probe attempts.
    pub max_retries: u32,
    /// Visible countdown length; zero disables the countdown.
    pub countdown_seconds: u64,
    /// Countdown tick spacing.
    pub countdown_tick_ms: u64,
    /// Lifetime of transient notices.
    pub message_dismiss_ms: u64,
    /// First probe backoff delay.
    pub retry_base_delay_ms: u64,
    /// Probe backoff ceiling.
    pub retry_max_delay_ms: u64,
    /// Random extra probe backoff.
    pub retry_jitter_ms: u64,
    /// Per-action countdown overrides keyed by wire name.
    ///
    /// Empty by default, so `countdown_seconds` governs every action. A
    /// config file opts in explicitly, for example
    /// `{"probe": 8, "login": 10, "updateProfile": 8, "updateMedia": 6}`.
    pub action_countdown_seconds: BTreeMap<String, u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            endpoint_url: String::new(),
            operating_hours: OperatingSchedule::parse_list("00:00-23:59").unwrap_or_default(),
            timeout_ms: 10_000,
            probe_timeout_ms: 8_000,
            max_retries: retry.max_retries,
            countdown_seconds: 10,
            countdown_tick_ms: 1_000,
            message_dismiss_ms: 5_000,
            retry_base_delay_ms: retry.base_delay_ms,
            retry_max_delay_ms: retry.max_delay_ms,
            retry_jitter_ms: retry.jitter_ms,
            action_countdown_seconds: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unreadable files, malformed values or a
    /// configuration that fails [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an injectable variable lookup.
    ///
    /// # Errors
    /// See [`AppConfig::load`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };

        if let Some(raw) = lookup("SPIMF_ENDPOINT_URL") {
            config.endpoint_url = raw.trim().to_string();
        }
        if let Some(raw) = lookup("SPIMF_OPERATING_HOURS") {
            config.operating_hours =
                OperatingSchedule::parse_list(&raw).map_err(ConfigError::Schedule)?;
            info!(operating_hours = %config.operating_hours, "operating hours overridden from env");
        }
        override_number(&lookup, "SPIMF_TIMEOUT_MS", &mut config.timeout_ms)?;
        override_number(&lookup, "SPIMF_PROBE_TIMEOUT_MS", &mut config.probe_timeout_ms)?;
        override_number(&lookup, "SPIMF_MAX_RETRIES", &mut config.max_retries)?;
        override_number(&lookup, "SPIMF_COUNTDOWN_SECONDS", &mut config.countdown_seconds)?;
        override_number(&lookup, "SPIMF_MESSAGE_DISMISS_MS", &mut config.message_dismiss_ms)?;

        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file; omitted keys keep their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        serde_json::from_str(&raw).map_err(ConfigError::Parse)
    }

    /// Checks cross-field invariants and returns the parsed endpoint.
    ///
    /// # Errors
    /// Returns [`ConfigError`] naming the first invalid setting.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::Missing("SPIMF_ENDPOINT_URL"));
        }
        let endpoint = validate_endpoint(&self.endpoint_url).map_err(ConfigError::Endpoint)?;

        for (key, value) in [
            ("timeout_ms", self.timeout_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("countdown_tick_ms", self.countdown_tick_ms),
            ("message_dismiss_ms", self.message_dismiss_ms),
        ] {
            if value == 0 {
                return Err(invalid(key, value, "must be greater than zero"));
            }
        }

        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(invalid(
                "retry_base_delay_ms",
                self.retry_base_delay_ms,
                "must not exceed retry_max_delay_ms",
            ));
        }

        for name in self.action_countdown_seconds.keys() {
            if ApiAction::from_wire_name(name).is_none() {
                return Err(invalid("action_countdown_seconds", name, "unknown action"));
            }
        }

        Ok(endpoint)
    }

    /// Probe retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
            jitter_ms: self.retry_jitter_ms,
        }
    }

    /// Countdown length for `action`; zero means no countdown.
    pub fn countdown_seconds_for(&self, action: ApiAction) -> u64 {
        self.action_countdown_seconds
            .get(action.wire_name())
            .copied()
            .unwrap_or(self.countdown_seconds)
    }

    /// Effective deadline for one `action` call.
    ///
    /// The transport timeout, shortened to the visible countdown when one is
    /// shown, so the countdown reaches zero exactly at the deadline.
    pub fn deadline_for(&self, action: ApiAction) -> Duration {
        let base_ms = match action {
            ApiAction::Probe => self.probe_timeout_ms,
            _ => self.timeout_ms,
        };
        let countdown_ms = self.countdown_seconds_for(action).saturating_mul(1_000);
        if countdown_ms == 0 {
            Duration::from_millis(base_ms)
        } else {
            Duration::from_millis(base_ms.min(countdown_ms))
        }
    }

    /// Countdown tick spacing.
    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }
}

fn override_number<F, T>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(());
    };

    *slot = raw
        .trim()
        .parse()
        .map_err(|error: T::Err| invalid(key, &raw, error))?;
    info!(key, value = %slot, "config overridden from env");
    Ok(())
}

fn invalid(key: &'static str, value: impl Display, reason: impl Display) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required setting absent.
    #[error("{0} is required")]
    Missing(&'static str),
    /// Setting present but unusable.
    #[error("invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`AppConfig`].
    #[error("config file parse failure: {0}")]
    Parse(serde_json::Error),
    /// Endpoint violates policy.
    #[error(transparent)]
    Endpoint(AuthError),
    /// Operating hours are malformed.
    #[error("invalid operating hours: {0}")]
    Schedule(CoreError),
}
