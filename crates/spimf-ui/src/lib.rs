#![warn(missing_docs)]
//! # spimf-ui
//!
//! ## Purpose
//! Defines the UI-facing state model for `spimf` and its pure text renderer.
//!
//! ## Responsibilities
//! - Hold the single visible [`ScreenState`] and the active [`Tab`].
//! - Keep one transient [`Notice`] per channel with an absolute expiry.
//! - Track which controls are busy while a request is in flight.
//! - Render state plus the member session into a [`ScreenView`].
//!
//! ## Data flow
//! The app controller mutates [`UiState`] in response to commands and request
//! outcomes; the shell calls [`render`] after each change and prints the
//! result. Nothing in this crate performs I/O.
//!
//! ## Ownership and lifetimes
//! `UiState` owns all text so reducers never borrow from responses.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Illegal requests
//! (for example switching tabs outside the app screen) return `false`.

mod render;

use std::collections::BTreeSet;

use spimf_core::TimeLabel;

pub use render::{CountdownView, ProfileView, ScreenView, render, render_countdown};

/// Top-level screen. Exactly one is visible at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Startup window check and connectivity probe.
    Loading,
    /// Outside operating hours.
    Maintenance,
    /// Login form.
    Login,
    /// Authenticated member area.
    App,
    /// Startup failed; only a reload leaves this screen.
    Error,
}

/// Member area tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Profile form.
    Profile,
    /// Social media form.
    Media,
    /// Read-only membership details.
    Info,
    /// Change log.
    Logs,
}

/// Message slot a notice is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeChannel {
    /// Under the login form.
    Login,
    /// Under the profile form.
    Profile,
    /// Under the media form.
    Media,
    /// Above the change log.
    Logs,
    /// Screen-wide banner.
    Global,
}

/// Notice tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Completed action.
    Success,
    /// Failed action.
    Error,
    /// Neutral information.
    Info,
}

/// Transient message with absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Slot the notice occupies.
    pub channel: NoticeChannel,
    /// Tone.
    pub kind: NoticeKind,
    /// Display text.
    pub text: String,
    /// Epoch milliseconds after which the notice is hidden.
    pub expires_at_ms: u64,
}

/// Controls disabled while their request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ControlId {
    /// Login submit button.
    LoginSubmit,
    /// Profile save button.
    ProfileSubmit,
    /// Media save button.
    MediaSubmit,
    /// Revert button.
    RevertSubmit,
    /// Log refresh button.
    LogsRefresh,
}

/// Terminal startup failure details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    /// Explanation shown to the user.
    pub message: String,
    /// Whether the reload affordance is offered.
    pub retry_available: bool,
}

/// Operating-window hint shown on the maintenance and app screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityView {
    /// System is closed; it opens at the label.
    OpensAt(TimeLabel),
    /// System is open; it closes at the label.
    ClosesAt(TimeLabel),
}

/// Aggregate UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    screen: ScreenState,
    tab: Tab,
    notices: Vec<Notice>,
    busy: BTreeSet<ControlId>,
    logout_pending: bool,
    /// Startup failure details, set with the error screen.
    pub error: Option<ErrorView>,
    /// Epoch milliseconds when the loading screen was shown.
    pub loading_started_ms: u64,
    /// Latest operating-window hint.
    pub availability: Option<AvailabilityView>,
    /// Fetched change log lines.
    pub logs: Vec<String>,
    /// Whether the social media detail fields are shown.
    pub social_media_visible: bool,
}

impl UiState {
    /// Creates state showing the loading screen.
    pub fn new(version: impl Into<String>, now_ms: u64) -> Self {
        Self {
            version: version.into(),
            screen: ScreenState::Loading,
            tab: Tab::Profile,
            notices: Vec::new(),
            busy: BTreeSet::new(),
            logout_pending: false,
            error: None,
            loading_started_ms: now_ms,
            availability: None,
            logs: Vec::new(),
            social_media_visible: false,
        }
    }

    /// Visible screen.
    pub fn screen(&self) -> ScreenState {
        self.screen
    }

    /// Active member tab.
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// Shows `screen`, hiding every other one.
    ///
    /// Entering the app resets the tab to [`Tab::Profile`]; leaving it drops
    /// any pending logout confirmation.
    pub fn show(&mut self, screen: ScreenState) {
        if screen == ScreenState::App && self.screen != ScreenState::App {
            self.tab = Tab::Profile;
        }
        if screen != ScreenState::App {
            self.logout_pending = false;
        }
        if screen != ScreenState::Error {
            self.error = None;
        }
        self.screen = screen;
    }

    /// Shows the error screen with a reload affordance.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.show(ScreenState::Error);
        self.error = Some(ErrorView {
            message: message.into(),
            retry_available: true,
        });
    }

    /// Switches tab; only legal on the app screen.
    pub fn switch_tab(&mut self, tab: Tab) -> bool {
        if self.screen != ScreenState::App {
            return false;
        }
        self.tab = tab;
        true
    }

    /// Posts a notice, replacing any notice already in that channel.
    pub fn post_notice(
        &mut self,
        channel: NoticeChannel,
        kind: NoticeKind,
        text: impl Into<String>,
        now_ms: u64,
        ttl_ms: u64,
    ) {
        self.notices.retain(|notice| notice.channel != channel);
        self.notices.push(Notice {
            channel,
            kind,
            text: text.into(),
            expires_at_ms: now_ms.saturating_add(ttl_ms),
        });
    }

    /// Notice visible in `channel` at `now_ms`.
    pub fn notice(&self, channel: NoticeChannel, now_ms: u64) -> Option<&Notice> {
        self.notices
            .iter()
            .find(|notice| notice.channel == channel && now_ms < notice.expires_at_ms)
    }

    /// Drops expired notices and returns how many were removed.
    pub fn prune_notices(&mut self, now_ms: u64) -> usize {
        let before = self.notices.len();
        self.notices.retain(|notice| now_ms < notice.expires_at_ms);
        before - self.notices.len()
    }

    /// Marks a control busy.
    pub fn set_busy(&mut self, control: ControlId) {
        self.busy.insert(control);
    }

    /// Re-enables a control.
    pub fn clear_busy(&mut self, control: ControlId) {
        self.busy.remove(&control);
    }

    /// Returns `true` while the control's request is in flight.
    pub fn is_busy(&self, control: ControlId) -> bool {
        self.busy.contains(&control)
    }

    /// Opens the logout confirmation; only legal on the app screen.
    pub fn request_logout(&mut self) -> bool {
        if self.screen != ScreenState::App {
            return false;
        }
        self.logout_pending = true;
        true
    }

    /// Closes the logout confirmation without logging out.
    pub fn cancel_logout(&mut self) {
        self.logout_pending = false;
    }

    /// Returns `true` while the logout confirmation is open.
    pub fn logout_pending(&self) -> bool {
        self.logout_pending
    }

    /// Clears everything tied to the member session.
    pub fn clear_session_view(&mut self) {
        self.tab = Tab::Profile;
        self.notices.clear();
        self.busy.clear();
        self.logout_pending = false;
        self.logs.clear();
        self.social_media_visible = false;
    }
}
