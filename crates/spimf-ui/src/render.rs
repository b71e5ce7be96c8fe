//! Pure text projection of [`UiState`] and the member session.

use spimf_auth::{SOCIAL_MEDIA_FIELD, STATUS_FIELD, Session};

use crate::{AvailabilityView, ControlId, NoticeChannel, NoticeKind, ScreenState, Tab, UiState};

const LOADING_DOT_PERIOD_MS: u64 = 500;
const PLACEHOLDER: &str = "-";

/// Read-only membership details: (label, record column).
const INFO_FIELDS: [(&str, &str); 10] = [
    ("Likes to repair", "DO YOU LIKE TO REPAIR"),
    ("Favourite subject", "YOUR FAVORITE SUBJECT"),
    ("Most difficult subject", "THE SUBJECT YOU FIND MOST DIFFICULT"),
    ("Knows us as", "YOU KNOW US AS"),
    ("Registered on", "CURRENT DATE"),
    ("Score", "SCORE"),
    ("ID card", "ID CARD REGISTRATION"),
    ("Member code", "KODE USER"),
    ("Membership account", "MEMBERSHIP ACCOUNT"),
    ("Membership password", "MEMBERSHIP PASSWORD ACCOUNT"),
];

/// Column name fragments that place a field on the media form.
const MEDIA_KEYWORDS: [&str; 6] = [
    "SOCIAL MEDIA",
    "FOLLOWERS",
    "INSTAGRAM",
    "TIKTOK",
    "FACEBOOK",
    "YOUTUBE",
];

fn is_media_column(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    MEDIA_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

/// Session projection used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    /// Member name or placeholder.
    pub display_name: String,
    /// Raw account status or placeholder.
    pub status: String,
    /// Whether the account is active.
    pub active: bool,
    /// Editable profile form fields.
    pub profile_fields: Vec<(String, String)>,
    /// Media form fields; the social media question comes first.
    pub media_fields: Vec<(String, String)>,
    /// Read-only membership details.
    pub info: Vec<(String, String)>,
}

impl ProfileView {
    /// Projects a live session.
    pub fn from_session(session: &Session) -> Self {
        let info_columns: Vec<&str> = INFO_FIELDS.iter().map(|(_, column)| *column).collect();

        let (mut media_fields, profile_fields): (Vec<_>, Vec<_>) = session
            .fields()
            .iter()
            .filter(|(name, _)| {
                name.as_str() != STATUS_FIELD && !info_columns.contains(&name.as_str())
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .partition(|(name, _)| is_media_column(name));
        media_fields.sort_by_key(|(name, _)| name.as_str() != SOCIAL_MEDIA_FIELD);

        Self {
            display_name: session.display_name().unwrap_or(PLACEHOLDER).to_string(),
            status: session.field(STATUS_FIELD).unwrap_or(PLACEHOLDER).to_string(),
            active: session.is_account_active(),
            profile_fields,
            media_fields,
            info: INFO_FIELDS
                .iter()
                .map(|(label, column)| {
                    (
                        (*label).to_string(),
                        session.field(column).unwrap_or(PLACEHOLDER).to_string(),
                    )
                })
                .collect(),
        }
    }
}

/// Countdown overlay contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownView {
    /// What the user is waiting for.
    pub label: String,
    /// Whole seconds left before the deadline.
    pub remaining_secs: u64,
}

/// Rendered screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenView {
    /// Screen that produced the view.
    pub screen: ScreenState,
    /// Heading line.
    pub title: String,
    /// Body lines in display order.
    pub lines: Vec<String>,
}

impl ScreenView {
    /// Joins title and body for terminal output.
    pub fn to_text(&self) -> String {
        let mut text = self.title.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// Renders the visible screen at `now_ms`.
pub fn render(state: &UiState, profile: Option<&ProfileView>, now_ms: u64) -> ScreenView {
    match state.screen() {
        ScreenState::Loading => render_loading(state, now_ms),
        ScreenState::Maintenance => render_maintenance(state),
        ScreenState::Login => render_login(state, now_ms),
        ScreenState::App => render_app(state, profile, now_ms),
        ScreenState::Error => render_error(state),
    }
}

/// Renders the countdown overlay line.
pub fn render_countdown(view: &CountdownView) -> String {
    format!("{} ... {}s", view.label, view.remaining_secs)
}

fn render_loading(state: &UiState, now_ms: u64) -> ScreenView {
    let elapsed_ms = now_ms.saturating_sub(state.loading_started_ms);
    let dots = ((elapsed_ms / LOADING_DOT_PERIOD_MS) % 4) as usize;

    ScreenView {
        screen: ScreenState::Loading,
        title: format!("Loading SPIMF system{}", ".".repeat(dots)),
        lines: vec![format!(
            "Loading: {}s | System is starting up",
            elapsed_ms / 1_000
        )],
    }
}

fn render_maintenance(state: &UiState) -> ScreenView {
    let mut lines = vec!["The system is outside its operating hours.".to_string()];
    if let Some(AvailabilityView::OpensAt(label)) = state.availability {
        lines.push(format!("Opens at: {label}"));
    }
    lines.push("Command: reload".to_string());

    ScreenView {
        screen: ScreenState::Maintenance,
        title: "SPIMF is closed".to_string(),
        lines,
    }
}

fn render_login(state: &UiState, now_ms: u64) -> ScreenView {
    let mut lines = Vec::new();
    push_notice(&mut lines, state, NoticeChannel::Global, now_ms);
    push_notice(&mut lines, state, NoticeChannel::Login, now_ms);
    lines.push(button_line(
        state,
        ControlId::LoginSubmit,
        "login <phone> <id-card> <member-code>",
    ));

    ScreenView {
        screen: ScreenState::Login,
        title: format!("SPIMF login (v{})", state.version),
        lines,
    }
}

fn render_app(state: &UiState, profile: Option<&ProfileView>, now_ms: u64) -> ScreenView {
    let mut lines = Vec::new();
    push_notice(&mut lines, state, NoticeChannel::Global, now_ms);

    let name = profile.map_or(PLACEHOLDER, |profile| profile.display_name.as_str());
    lines.push(format!("Hi, {name}! Welcome back to SPIMF"));

    if let Some(profile) = profile {
        let tone = if profile.active { "active" } else { "inactive" };
        lines.push(format!("Status: {} ({tone})", profile.status));
    }
    if let Some(AvailabilityView::ClosesAt(label)) = state.availability {
        lines.push(format!("System closes at: {label}"));
    }

    lines.push(format!("Tab: {:?}", state.tab()));
    match state.tab() {
        Tab::Profile | Tab::Media => {
            let channel = if state.tab() == Tab::Profile {
                NoticeChannel::Profile
            } else {
                NoticeChannel::Media
            };
            push_notice(&mut lines, state, channel, now_ms);
            if let Some(profile) = profile {
                let fields = if state.tab() == Tab::Profile {
                    &profile.profile_fields
                } else {
                    &profile.media_fields
                };
                for (name, value) in fields.iter().filter(|(name, _)| {
                    state.tab() == Tab::Profile
                        || state.social_media_visible
                        || name.as_str() == SOCIAL_MEDIA_FIELD
                }) {
                    lines.push(format!("  {name}: {value}"));
                }
            }
            let control = if state.tab() == Tab::Profile {
                ControlId::ProfileSubmit
            } else {
                ControlId::MediaSubmit
            };
            lines.push(button_line(state, control, "set <field>=<value> ... | save"));
            lines.push(button_line(state, ControlId::RevertSubmit, "revert"));
        }
        Tab::Info => {
            if let Some(profile) = profile {
                for (label, value) in &profile.info {
                    lines.push(format!("  {label}: {value}"));
                }
            }
        }
        Tab::Logs => {
            push_notice(&mut lines, state, NoticeChannel::Logs, now_ms);
            if state.logs.is_empty() {
                lines.push("  (no log entries)".to_string());
            }
            for entry in &state.logs {
                lines.push(format!("  {entry}"));
            }
            lines.push(button_line(state, ControlId::LogsRefresh, "logs"));
        }
    }

    if state.logout_pending() {
        lines.push("Are you sure you want to log out? (yes/no)".to_string());
    }

    ScreenView {
        screen: ScreenState::App,
        title: "SPIMF member area".to_string(),
        lines,
    }
}

fn render_error(state: &UiState) -> ScreenView {
    let mut lines = Vec::new();
    if let Some(error) = &state.error {
        lines.push(error.message.clone());
        if error.retry_available {
            lines.push("Command: reload".to_string());
        }
    }

    ScreenView {
        screen: ScreenState::Error,
        title: "System error".to_string(),
        lines,
    }
}

fn push_notice(lines: &mut Vec<String>, state: &UiState, channel: NoticeChannel, now_ms: u64) {
    if let Some(notice) = state.notice(channel, now_ms) {
        let marker = match notice.kind {
            NoticeKind::Success => "[ok]",
            NoticeKind::Error => "[error]",
            NoticeKind::Info => "[info]",
        };
        lines.push(format!("{marker} {}", notice.text));
    }
}

fn button_line(state: &UiState, control: ControlId, hint: &str) -> String {
    if state.is_busy(control) {
        format!("> {hint} (working...)")
    } else {
        format!("> {hint}")
    }
}
