//! Line-oriented input for the terminal shell.
//!
//! Each line maps to at most one [`Command`]. Field edits are staged locally
//! with `set` and sent with `save`, mirroring an edit form with a submit
//! button.

use spimf_auth::{Credentials, FieldUpdates};
use spimf_ui::Tab;

use crate::controller::Command;

/// Help text printed by `help`.
pub const SHELL_HELP: &str = "\
commands:
  login <phone> <id-card> <kode-user>
  set <field>=<value>     stage a field edit
  save                    send staged edits for the current tab
  revert                  restore data from backup
  logs                    fetch change log
  tab profile|media|info|logs
  logout, yes, no
  reload, help, quit";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// Dispatch a command.
    Command(Command),
    /// A field edit was staged; nothing to dispatch.
    Staged {
        /// Field name.
        field: String,
    },
    /// Print help.
    Help,
    /// Leave the shell.
    Quit,
    /// Blank line.
    Empty,
    /// Unrecognized or malformed input.
    Invalid(String),
}

/// Parses one line.
///
/// `tab` selects what `save` sends. `pending` collects `set` edits and is
/// drained by `save`.
pub fn parse_shell_line(line: &str, tab: Tab, pending: &mut FieldUpdates) -> ShellInput {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "" => ShellInput::Empty,
        "login" => parse_login(rest),
        "set" => match rest.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                let field = field.trim().to_string();
                pending.insert(field.clone(), value.trim().to_string());
                ShellInput::Staged { field }
            }
            _ => ShellInput::Invalid("usage: set <field>=<value>".to_string()),
        },
        "save" => {
            let updates = std::mem::take(pending);
            match tab {
                Tab::Media => ShellInput::Command(Command::UpdateMedia(updates)),
                _ => ShellInput::Command(Command::UpdateProfile(updates)),
            }
        }
        "revert" => ShellInput::Command(Command::RevertData),
        "logs" => ShellInput::Command(Command::FetchLogs),
        "tab" => match parse_tab(rest) {
            Some(tab) => ShellInput::Command(Command::SwitchTab(tab)),
            None => ShellInput::Invalid(format!("unknown tab {rest:?}")),
        },
        "logout" => ShellInput::Command(Command::RequestLogout),
        "yes" | "y" => ShellInput::Command(Command::ConfirmLogout),
        "no" | "n" => ShellInput::Command(Command::CancelLogout),
        "reload" => ShellInput::Command(Command::Reload),
        "help" | "?" => ShellInput::Help,
        "quit" | "exit" => ShellInput::Quit,
        other => ShellInput::Invalid(format!("unknown command {other:?}")),
    }
}

fn parse_login(rest: &str) -> ShellInput {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    match parts.as_slice() {
        [phone_number, id_card, kode_user] => ShellInput::Command(Command::Login(Credentials {
            phone_number: (*phone_number).to_string(),
            id_card: (*id_card).to_string(),
            kode_user: (*kode_user).to_string(),
        })),
        _ => ShellInput::Invalid("usage: login <phone> <id-card> <kode-user>".to_string()),
    }
}

fn parse_tab(raw: &str) -> Option<Tab> {
    match raw.to_ascii_lowercase().as_str() {
        "profile" => Some(Tab::Profile),
        "media" => Some(Tab::Media),
        "info" => Some(Tab::Info),
        "logs" => Some(Tab::Logs),
        _ => None,
    }
}
