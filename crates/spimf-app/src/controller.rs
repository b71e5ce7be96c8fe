//! Application controller: the single owner of session and screen state.
//!
//! Every user intent arrives as a [`Command`]. The controller checks that the
//! command is legal on the visible screen, issues at most one request through
//! [`RequestController`], and folds the outcome back into [`UiState`] and the
//! [`SessionMachine`]. Renderers only read.

use std::sync::Arc;

use serde_json::{Map, Value};
use spimf_auth::{AuthError, Credentials, FieldUpdates, Session, SessionMachine};
use spimf_core::{is_active, next_activation, next_deactivation};
use spimf_transport::{ApiAction, ApiTransport, Payload};
use spimf_ui::{
    AvailabilityView, ControlId, CountdownView, NoticeChannel, NoticeKind, ProfileView,
    ScreenState, ScreenView, Tab, UiState, render,
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::lifecycle::{FailureReason, RequestController, RequestOutcome};
use crate::telemetry::redact_sensitive;
use crate::{AppError, app_version};

/// Notice shown when a user action runs out of time.
pub const REQUEST_TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";

/// Error screen text when the startup probe runs out of time.
pub const PROBE_TIMEOUT_MESSAGE: &str = "Could not reach the server in time. Please reload.";

/// User intents accepted by [`AppController::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// First startup.
    Start,
    /// Restart from the loading screen.
    Reload,
    /// Submit the login form.
    Login(Credentials),
    /// Save profile fields.
    UpdateProfile(FieldUpdates),
    /// Save social media fields.
    UpdateMedia(FieldUpdates),
    /// Restore the member record from the server backup.
    RevertData,
    /// Fetch the change log.
    FetchLogs,
    /// Change the member tab.
    SwitchTab(Tab),
    /// Open the logout confirmation.
    RequestLogout,
    /// Accept the logout confirmation.
    ConfirmLogout,
    /// Dismiss the logout confirmation.
    CancelLogout,
    /// Periodic housekeeping.
    Tick,
}

impl Command {
    /// Stable name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Reload => "reload",
            Self::Login(_) => "login",
            Self::UpdateProfile(_) => "update_profile",
            Self::UpdateMedia(_) => "update_media",
            Self::RevertData => "revert_data",
            Self::FetchLogs => "fetch_logs",
            Self::SwitchTab(_) => "switch_tab",
            Self::RequestLogout => "request_logout",
            Self::ConfirmLogout => "confirm_logout",
            Self::CancelLogout => "cancel_logout",
            Self::Tick => "tick",
        }
    }
}

/// Owns configuration, session and UI state for one running app.
pub struct AppController {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    requests: RequestController,
    ui: UiState,
    sessions: SessionMachine,
    countdown_tx: watch::Sender<Option<CountdownView>>,
}

impl AppController {
    /// Creates a controller showing the loading screen.
    ///
    /// `config` is expected to have passed [`AppConfig::validate`].
    pub fn new(config: AppConfig, transport: Arc<dyn ApiTransport>, clock: Arc<dyn Clock>) -> Self {
        let requests = RequestController::new(transport, config.countdown_tick());
        let (countdown_tx, _) = watch::channel(None);
        let ui = UiState::new(app_version(), clock.now_ms());
        Self {
            config,
            clock,
            requests,
            ui,
            sessions: SessionMachine::new(),
            countdown_tx,
        }
    }

    /// Current UI state.
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Authenticated member, if any.
    pub fn session(&self) -> Option<&Session> {
        self.sessions.session()
    }

    /// Active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Subscribes to the countdown of the request in flight.
    ///
    /// The value is `None` whenever no countdown is running.
    pub fn countdown(&self) -> watch::Receiver<Option<CountdownView>> {
        self.countdown_tx.subscribe()
    }

    /// Renders the visible screen at the current clock time.
    pub fn view(&self) -> ScreenView {
        let profile = self.sessions.session().map(ProfileView::from_session);
        render(&self.ui, profile.as_ref(), self.clock.now_ms())
    }

    /// Applies one command.
    ///
    /// Request failures are surfaced as notices or the error screen and do
    /// not produce `Err`.
    ///
    /// # Errors
    /// Returns [`AppError::CommandRejected`] when the command is not legal on
    /// the visible screen, and [`AppError::Auth`] for blank login fields.
    pub async fn dispatch(&mut self, command: Command) -> Result<(), AppError> {
        let name = command.name();
        debug!(command = name, screen = ?self.ui.screen(), "dispatch");

        match command {
            Command::Start | Command::Reload => {
                self.start().await;
                Ok(())
            }
            Command::Login(credentials) => {
                self.require(name, ScreenState::Login)?;
                self.login(credentials).await
            }
            Command::UpdateProfile(updates) => {
                self.require(name, ScreenState::App)?;
                self.update_fields(ApiAction::UpdateProfile, updates).await
            }
            Command::UpdateMedia(updates) => {
                self.require(name, ScreenState::App)?;
                self.update_fields(ApiAction::UpdateMedia, updates).await
            }
            Command::RevertData => {
                self.require(name, ScreenState::App)?;
                self.revert().await
            }
            Command::FetchLogs => {
                self.require(name, ScreenState::App)?;
                self.fetch_logs().await
            }
            Command::SwitchTab(tab) => {
                self.require(name, ScreenState::App)?;
                self.ui.switch_tab(tab);
                Ok(())
            }
            Command::RequestLogout => {
                self.require(name, ScreenState::App)?;
                self.ui.request_logout();
                Ok(())
            }
            Command::ConfirmLogout => {
                self.require(name, ScreenState::App)?;
                if !self.ui.logout_pending() {
                    return Err(self.rejected(name));
                }
                self.logout();
                Ok(())
            }
            Command::CancelLogout => {
                self.require(name, ScreenState::App)?;
                self.ui.cancel_logout();
                Ok(())
            }
            Command::Tick => {
                self.tick();
                Ok(())
            }
        }
    }

    fn require(&self, command: &'static str, screen: ScreenState) -> Result<(), AppError> {
        if self.ui.screen() == screen {
            Ok(())
        } else {
            Err(self.rejected(command))
        }
    }

    fn rejected(&self, command: &'static str) -> AppError {
        warn!(command, screen = ?self.ui.screen(), "command rejected");
        AppError::CommandRejected {
            command,
            screen: self.ui.screen(),
        }
    }

    async fn start(&mut self) {
        self.sessions.logout();
        self.ui = UiState::new(app_version(), self.clock.now_ms());

        let now = self.clock.time_of_day();
        let schedule = &self.config.operating_hours;
        if !is_active(now, schedule) {
            let opens_at = next_activation(now, schedule);
            info!(%now, %opens_at, "outside operating hours");
            self.ui.availability = Some(AvailabilityView::OpensAt(opens_at));
            self.ui.show(ScreenState::Maintenance);
            return;
        }
        self.ui.availability = Some(AvailabilityView::ClosesAt(next_deactivation(now, schedule)));

        match self.probe().await {
            Ok(()) => self.ui.show(ScreenState::Login),
            Err(message) => self.ui.show_error(message),
        }
        info!(screen = ?self.ui.screen(), "startup finished");
    }

    async fn probe(&self) -> Result<(), String> {
        let policy = self.config.retry_policy();
        let payload = Payload::new();
        let mut attempt = 1;

        loop {
            let outcome = self
                .call(ApiAction::Probe, &payload, "Connecting to SPIMF")
                .await;
            let (message, retriable) = match outcome {
                RequestOutcome::Success(_) => {
                    info!(attempt, "connectivity probe succeeded");
                    return Ok(());
                }
                RequestOutcome::Timeout => (PROBE_TIMEOUT_MESSAGE.to_string(), true),
                RequestOutcome::Failure(reason) => {
                    let retriable = reason.is_retriable();
                    (reason.message().to_string(), retriable)
                }
            };

            if !retriable || !policy.allows_another(attempt) {
                error!(
                    attempt,
                    retriable,
                    reason = %redact_sensitive(&message),
                    "connectivity probe gave up"
                );
                return Err(message);
            }

            let delay = policy.delay_after(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %redact_sensitive(&message),
                "connectivity probe failed; retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn login(&mut self, credentials: Credentials) -> Result<(), AppError> {
        let request = match credentials.to_login_request() {
            Ok(request) => request,
            Err(error) => {
                self.notify(NoticeChannel::Login, NoticeKind::Error, error.to_string());
                return Err(error.into());
            }
        };

        info!(fingerprint = %credentials.fingerprint(), "login attempt");
        let payload = request.into_payload();
        let outcome = self
            .run_request(ControlId::LoginSubmit, ApiAction::Login, &payload, "Signing in")
            .await;

        match outcome {
            RequestOutcome::Success(response) => {
                let session = response
                    .user_data
                    .as_ref()
                    .ok_or_else(|| AuthError::InvalidResponse("missing userData".to_string()))
                    .and_then(|user_data| Session::from_login(user_data, response.row.as_ref()));

                match session {
                    Ok(session) => {
                        let greeting = match session.display_name() {
                            Some(name) => format!("Welcome, {name}"),
                            None => "Login successful".to_string(),
                        };
                        info!(row = session.row().0, "login succeeded");
                        self.ui.social_media_visible = session.has_social_media();
                        self.sessions.on_login_success(session);
                        self.ui.show(ScreenState::App);
                        self.notify(NoticeChannel::Global, NoticeKind::Success, greeting);
                    }
                    Err(error) => {
                        warn!(%error, "login response unusable");
                        self.notify(NoticeChannel::Login, NoticeKind::Error, error.to_string());
                    }
                }
            }
            RequestOutcome::Failure(reason) => {
                if let FailureReason::Application { banned: true, .. } = &reason {
                    warn!(fingerprint = %credentials.fingerprint(), "login refused: account banned");
                }
                self.notify(NoticeChannel::Login, NoticeKind::Error, reason.message());
            }
            RequestOutcome::Timeout => {
                self.notify(NoticeChannel::Login, NoticeKind::Error, REQUEST_TIMEOUT_MESSAGE);
            }
        }
        Ok(())
    }

    async fn update_fields(&mut self, action: ApiAction, updates: FieldUpdates) -> Result<(), AppError> {
        let (control, channel, label, done) = match action {
            ApiAction::UpdateMedia => (
                ControlId::MediaSubmit,
                NoticeChannel::Media,
                "Saving social media",
                "Social media updated",
            ),
            _ => (
                ControlId::ProfileSubmit,
                NoticeChannel::Profile,
                "Saving profile",
                "Profile updated",
            ),
        };

        if updates.is_empty() {
            self.notify(channel, NoticeKind::Info, "No changes to save");
            return Ok(());
        }

        let mut payload = self.row_payload()?;
        let encoded: Map<String, Value> = updates
            .iter()
            .map(|(field, value)| (field.clone(), Value::String(value.clone())))
            .collect();
        payload.insert("updates".to_string(), Value::Object(encoded));

        match self.run_request(control, action, &payload, label).await {
            RequestOutcome::Success(response) => {
                if let Some(session) = self.sessions.session_mut() {
                    session.apply_updates(&updates);
                    self.ui.social_media_visible = session.has_social_media();
                }
                info!(%action, fields = updates.len(), "member fields saved");
                let message = response.message.unwrap_or_else(|| done.to_string());
                self.notify(channel, NoticeKind::Success, message);
            }
            RequestOutcome::Failure(reason) => {
                self.notify(channel, NoticeKind::Error, reason.message());
            }
            RequestOutcome::Timeout => {
                self.notify(channel, NoticeKind::Error, REQUEST_TIMEOUT_MESSAGE);
            }
        }
        Ok(())
    }

    async fn revert(&mut self) -> Result<(), AppError> {
        let payload = self.row_payload()?;
        let outcome = self
            .run_request(ControlId::RevertSubmit, ApiAction::RevertData, &payload, "Restoring data")
            .await;

        match outcome {
            RequestOutcome::Success(response) => {
                if let (Some(session), Some(user_data)) =
                    (self.sessions.session_mut(), response.user_data.as_ref())
                {
                    session.replace_fields(user_data);
                    self.ui.social_media_visible = session.has_social_media();
                }
                let message = response
                    .message
                    .unwrap_or_else(|| "Data restored".to_string());
                self.notify(NoticeChannel::Profile, NoticeKind::Success, message);
            }
            RequestOutcome::Failure(reason) => {
                self.notify(NoticeChannel::Profile, NoticeKind::Error, reason.message());
            }
            RequestOutcome::Timeout => {
                self.notify(NoticeChannel::Profile, NoticeKind::Error, REQUEST_TIMEOUT_MESSAGE);
            }
        }
        Ok(())
    }

    async fn fetch_logs(&mut self) -> Result<(), AppError> {
        let payload = self.row_payload()?;
        let outcome = self
            .run_request(ControlId::LogsRefresh, ApiAction::GetLogs, &payload, "Loading logs")
            .await;

        match outcome {
            RequestOutcome::Success(response) => {
                self.ui.logs = response.log_lines();
                self.ui.switch_tab(Tab::Logs);
                let message = if self.ui.logs.is_empty() {
                    "No changes recorded".to_string()
                } else {
                    format!("{} log entries", self.ui.logs.len())
                };
                self.notify(NoticeChannel::Logs, NoticeKind::Info, message);
            }
            RequestOutcome::Failure(reason) => {
                self.notify(NoticeChannel::Logs, NoticeKind::Error, reason.message());
            }
            RequestOutcome::Timeout => {
                self.notify(NoticeChannel::Logs, NoticeKind::Error, REQUEST_TIMEOUT_MESSAGE);
            }
        }
        Ok(())
    }

    fn logout(&mut self) {
        if let Some(session) = self.sessions.session() {
            info!(row = session.row().0, "logout");
        }
        self.sessions.logout();
        self.ui.clear_session_view();
        self.ui.show(ScreenState::Login);
        self.notify(NoticeChannel::Login, NoticeKind::Info, "You have been logged out");
    }

    fn tick(&mut self) {
        let pruned = self.ui.prune_notices(self.clock.now_ms());
        if pruned > 0 {
            debug!(pruned, "notices expired");
        }

        if matches!(self.ui.screen(), ScreenState::Loading | ScreenState::Error) {
            return;
        }
        let now = self.clock.time_of_day();
        let schedule = &self.config.operating_hours;
        self.ui.availability = Some(if is_active(now, schedule) {
            AvailabilityView::ClosesAt(next_deactivation(now, schedule))
        } else {
            AvailabilityView::OpensAt(next_activation(now, schedule))
        });
    }

    fn row_payload(&self) -> Result<Payload, AppError> {
        let session = self.sessions.session().ok_or(AppError::NoSession)?;
        let mut payload = Payload::new();
        payload.insert("row".to_string(), Value::from(session.row().0));
        Ok(payload)
    }

    fn notify(&mut self, channel: NoticeChannel, kind: NoticeKind, text: impl Into<String>) {
        let now_ms = self.clock.now_ms();
        self.ui
            .post_notice(channel, kind, text, now_ms, self.config.message_dismiss_ms);
    }

    async fn run_request(
        &mut self,
        control: ControlId,
        action: ApiAction,
        payload: &Payload,
        label: &str,
    ) -> RequestOutcome {
        self.ui.set_busy(control);
        let outcome = self.call(action, payload, label).await;
        self.ui.clear_busy(control);
        outcome
    }

    async fn call(&self, action: ApiAction, payload: &Payload, label: &str) -> RequestOutcome {
        let timeout = self.config.deadline_for(action);
        if self.config.countdown_seconds_for(action) == 0 {
            return self.requests.execute(action, payload, timeout).await;
        }

        let outcome = self
            .requests
            .execute_with_countdown(action, payload, timeout, |tick| {
                self.countdown_tx.send_replace(Some(CountdownView {
                    label: label.to_string(),
                    remaining_secs: tick.remaining_secs(),
                }));
            })
            .await;
        self.countdown_tx.send_replace(None);
        outcome
    }
}
