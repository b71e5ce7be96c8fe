#![warn(missing_docs)]
//! # spimf-app
//!
//! ## Purpose
//! Composes the operating-window evaluator, the request lifecycle, the member
//! session and the UI state into the `spimf` membership portal client.
//!
//! ## Responsibilities
//! - Gate startup on the configured operating hours.
//! - Run every API call under one hard deadline with an optional countdown.
//! - Retry the startup connectivity probe within a bounded policy.
//! - Apply [`Command`]s to session and screen state from a single owner.
//!
//! ## Data flow
//! Shell line -> [`Command`] -> [`AppController::dispatch`] ->
//! [`RequestController`] -> transport -> [`RequestOutcome`] -> `UiState` ->
//! rendered [`spimf_ui::ScreenView`].
//!
//! ## Ownership and lifetimes
//! [`AppController`] is owned by one task and mutated through `&mut self`.
//! The countdown of the request in flight is published on a `watch` channel
//! so a renderer task can read it without touching controller state.
//!
//! ## Error model
//! Request failures become notices or the error screen. [`AppError`] is
//! reserved for commands that cannot be issued at all and for startup
//! configuration failures.
//!
//! ## Security and privacy notes
//! - Credentials never reach a log line; login attempts log a fingerprint.
//! - Failure reasons pass through [`redact_sensitive`] before they are logged.
//! - The endpoint must be HTTPS.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use spimf_app::{AppConfig, AppController, Command, SystemClock};
//! use spimf_transport::HttpTransport;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let transport = HttpTransport::new(config.validate()?)?;
//! let mut app = AppController::new(config, Arc::new(transport), Arc::new(SystemClock));
//! app.dispatch(Command::Start).await?;
//! println!("{}", app.view().to_text());
//! # Ok(())
//! # }
//! ```

mod clock;
mod config;
mod controller;
mod countdown;
mod lifecycle;
mod shell;
mod telemetry;

use spimf_auth::AuthError;
use spimf_core::CoreError;
use spimf_transport::TransportError;
use spimf_ui::ScreenState;
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, CONFIG_PATH_ENV, ConfigError};
pub use controller::{AppController, Command, PROBE_TIMEOUT_MESSAGE, REQUEST_TIMEOUT_MESSAGE};
pub use countdown::{Countdown, CountdownTick};
pub use lifecycle::{FailureReason, RequestController, RequestOutcome};
pub use shell::{SHELL_HELP, ShellInput, parse_shell_line};
pub use telemetry::{init_tracing, redact_sensitive};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SPIMF_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Command is not legal on the visible screen.
    #[error("{command} is not available on the {screen:?} screen")]
    CommandRejected {
        /// Command name.
        command: &'static str,
        /// Screen that was visible.
        screen: ScreenState,
    },
    /// Command needs an authenticated member.
    #[error("no member is signed in")]
    NoSession,
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Auth subsystem error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Transport construction error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}
