//! Integration tests for terminal shell line parsing.

use spimf_app::{Command, ShellInput, parse_shell_line};
use spimf_auth::{Credentials, FieldUpdates};
use spimf_ui::Tab;

#[test]
fn shell_input_tests_login_takes_three_fields() {
    let mut pending = FieldUpdates::new();
    let parsed = parse_shell_line("login 0123456789 900101-14-5678 SP-0042", Tab::Profile, &mut pending);

    assert_eq!(
        parsed,
        ShellInput::Command(Command::Login(Credentials {
            phone_number: "0123456789".to_string(),
            id_card: "900101-14-5678".to_string(),
            kode_user: "SP-0042".to_string(),
        }))
    );
    assert!(matches!(
        parse_shell_line("login 0123456789", Tab::Profile, &mut pending),
        ShellInput::Invalid(_)
    ));
}

#[test]
fn shell_input_tests_save_drains_staged_edits_for_current_tab() {
    let mut pending = FieldUpdates::new();
    assert_eq!(
        parse_shell_line("set YOUR NAME = Aina R.", Tab::Profile, &mut pending),
        ShellInput::Staged {
            field: "YOUR NAME".to_string()
        }
    );
    parse_shell_line("set LINK=https://x.test/?a=b", Tab::Media, &mut pending);

    let parsed = parse_shell_line("save", Tab::Media, &mut pending);
    let ShellInput::Command(Command::UpdateMedia(updates)) = parsed else {
        panic!("expected media update, got {parsed:?}");
    };
    assert_eq!(updates.get("YOUR NAME").map(String::as_str), Some("Aina R."));
    assert_eq!(
        updates.get("LINK").map(String::as_str),
        Some("https://x.test/?a=b")
    );
    assert!(pending.is_empty());

    assert_eq!(
        parse_shell_line("save", Tab::Info, &mut pending),
        ShellInput::Command(Command::UpdateProfile(FieldUpdates::new()))
    );
}

#[test]
fn shell_input_tests_simple_verbs_map_to_commands() {
    let mut pending = FieldUpdates::new();
    let cases = [
        ("revert", ShellInput::Command(Command::RevertData)),
        ("logs", ShellInput::Command(Command::FetchLogs)),
        ("tab media", ShellInput::Command(Command::SwitchTab(Tab::Media))),
        ("logout", ShellInput::Command(Command::RequestLogout)),
        ("YES", ShellInput::Command(Command::ConfirmLogout)),
        ("no", ShellInput::Command(Command::CancelLogout)),
        ("reload", ShellInput::Command(Command::Reload)),
        ("help", ShellInput::Help),
        ("quit", ShellInput::Quit),
        ("   ", ShellInput::Empty),
    ];

    for (line, expected) in cases {
        assert_eq!(parse_shell_line(line, Tab::Profile, &mut pending), expected, "{line}");
    }
    assert!(matches!(
        parse_shell_line("tab settings", Tab::Profile, &mut pending),
        ShellInput::Invalid(_)
    ));
}
