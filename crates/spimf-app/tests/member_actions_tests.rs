//! Integration tests for in-app member actions, notices and logout.

mod common;

use std::sync::Arc;

use common::{Reply, ScriptedTransport, controller, login_ok, probe_ok};
use serde_json::json;
use spimf_app::{AppController, Clock, Command, ManualClock};
use spimf_auth::{Credentials, FieldUpdates, SOCIAL_MEDIA_FIELD};
use spimf_transport::{ApiAction, TransportError};
use spimf_ui::{ControlId, NoticeChannel, NoticeKind, ScreenState, Tab};

async fn signed_in(transport: Arc<ScriptedTransport>) -> (AppController, Arc<ManualClock>) {
    transport.push(ApiAction::Probe, probe_ok());
    transport.push(ApiAction::Login, login_ok());
    let (mut app, clock) = controller(transport);
    app.dispatch(Command::Start).await.expect("start");
    app.dispatch(Command::Login(Credentials {
        phone_number: "0123456789".to_string(),
        id_card: "900101-14-5678".to_string(),
        kode_user: "SP-0042".to_string(),
    }))
    .await
    .expect("login");
    assert_eq!(app.ui().screen(), ScreenState::App);
    (app, clock)
}

fn updates(pairs: &[(&str, &str)]) -> FieldUpdates {
    pairs
        .iter()
        .map(|(field, value)| ((*field).to_string(), (*value).to_string()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_profile_update_sends_row_and_merges_fields() {
    let transport = ScriptedTransport::new();
    transport.push(ApiAction::UpdateProfile, Reply::Json(json!({"success": true})));
    let (mut app, clock) = signed_in(transport.clone()).await;

    app.dispatch(Command::UpdateProfile(updates(&[("YOUR NAME", "Aina R.")])))
        .await
        .expect("update");

    let (_, payload) = transport.calls().pop().expect("update call");
    assert_eq!(payload.get("row"), Some(&json!(7)));
    assert_eq!(payload.get("updates"), Some(&json!({"YOUR NAME": "Aina R."})));

    let session = app.session().expect("session");
    assert_eq!(session.display_name(), Some("Aina R."));
    let notice = app
        .ui()
        .notice(NoticeChannel::Profile, clock.now_ms())
        .expect("profile notice");
    assert_eq!(notice.kind, NoticeKind::Success);
    assert_eq!(notice.text, "Profile updated");
    assert!(!app.ui().is_busy(ControlId::ProfileSubmit));
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_media_update_toggles_social_media_section() {
    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::UpdateMedia,
        Reply::Json(json!({"success": true, "message": "Media saved"})),
    );
    let (mut app, clock) = signed_in(transport.clone()).await;
    assert!(!app.ui().social_media_visible);

    app.dispatch(Command::UpdateMedia(updates(&[(SOCIAL_MEDIA_FIELD, "YES")])))
        .await
        .expect("update");

    assert!(app.ui().social_media_visible);
    let notice = app
        .ui()
        .notice(NoticeChannel::Media, clock.now_ms())
        .expect("media notice");
    assert_eq!(notice.text, "Media saved");
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_failed_update_keeps_fields_and_clears_busy() {
    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::UpdateProfile,
        Reply::Error(TransportError::Network("connection reset".to_string())),
    );
    let (mut app, clock) = signed_in(transport.clone()).await;

    app.dispatch(Command::UpdateProfile(updates(&[("YOUR NAME", "Someone Else")])))
        .await
        .expect("update dispatch");

    assert_eq!(app.ui().screen(), ScreenState::App);
    assert_eq!(
        app.session().and_then(|session| session.display_name()),
        Some("Aina Rahman")
    );
    assert!(!app.ui().is_busy(ControlId::ProfileSubmit));
    let notice = app
        .ui()
        .notice(NoticeChannel::Profile, clock.now_ms())
        .expect("error notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(
        transport.call_count(ApiAction::UpdateProfile),
        1,
        "user actions are never retried"
    );
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_empty_update_sends_nothing() {
    let transport = ScriptedTransport::new();
    let (mut app, _clock) = signed_in(transport.clone()).await;

    app.dispatch(Command::UpdateProfile(FieldUpdates::new()))
        .await
        .expect("update");

    assert_eq!(transport.call_count(ApiAction::UpdateProfile), 0);
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_revert_replaces_fields_from_backup() {
    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::RevertData,
        Reply::Json(json!({
            "success": true,
            "userData": {"YOUR NAME": "Aina Binti Rahman", "STATUS ACCOUNT": "✅AKTIF"}
        })),
    );
    let (mut app, _clock) = signed_in(transport.clone()).await;

    app.dispatch(Command::RevertData).await.expect("revert");

    let session = app.session().expect("session");
    assert_eq!(session.display_name(), Some("Aina Binti Rahman"));
    assert_eq!(session.field("PHONE NUMBER"), None);
    assert_eq!(session.row().0, 7);
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_fetch_logs_stores_entries_and_switches_tab() {
    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::GetLogs,
        Reply::Json(json!({
            "success": true,
            "logs": ["2024-05-01 YOUR NAME changed", {"field": "PHONE NUMBER"}]
        })),
    );
    let (mut app, _clock) = signed_in(transport.clone()).await;

    app.dispatch(Command::FetchLogs).await.expect("logs");

    assert_eq!(app.ui().tab(), Tab::Logs);
    assert_eq!(app.ui().logs.len(), 2);
    assert_eq!(app.ui().logs[0], "2024-05-01 YOUR NAME changed");
    let (_, payload) = transport.calls().pop().expect("logs call");
    assert_eq!(payload.get("row"), Some(&json!(7)));
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_logout_requires_confirmation() {
    let transport = ScriptedTransport::new();
    let (mut app, _clock) = signed_in(transport.clone()).await;

    assert!(app.dispatch(Command::ConfirmLogout).await.is_err());
    assert_eq!(app.ui().screen(), ScreenState::App);

    app.dispatch(Command::RequestLogout).await.expect("request");
    app.dispatch(Command::CancelLogout).await.expect("cancel");
    assert!(!app.ui().logout_pending());
    assert!(app.session().is_some());

    app.dispatch(Command::SwitchTab(Tab::Info)).await.expect("tab");
    app.dispatch(Command::RequestLogout).await.expect("request");
    app.dispatch(Command::ConfirmLogout).await.expect("confirm");

    assert_eq!(app.ui().screen(), ScreenState::Login);
    assert!(app.session().is_none());
    assert_eq!(app.ui().tab(), Tab::Profile);
    assert!(app.ui().logs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_notices_auto_dismiss_after_configured_delay() {
    let transport = ScriptedTransport::new();
    let (mut app, clock) = signed_in(transport.clone()).await;
    let dismiss_ms = app.config().message_dismiss_ms;

    assert!(app.ui().notice(NoticeChannel::Global, clock.now_ms()).is_some());

    clock.advance_ms(dismiss_ms - 1);
    app.dispatch(Command::Tick).await.expect("tick");
    assert!(app.ui().notice(NoticeChannel::Global, clock.now_ms()).is_some());

    clock.advance_ms(1);
    app.dispatch(Command::Tick).await.expect("tick");
    assert!(app.ui().notice(NoticeChannel::Global, clock.now_ms()).is_none());
    assert!(!app.view().to_text().contains("Welcome, Aina Rahman"));
}

#[tokio::test(start_paused = true)]
async fn member_actions_tests_tick_refreshes_closing_label_without_leaving_app() {
    let transport = ScriptedTransport::new();
    let (mut app, clock) = signed_in(transport.clone()).await;

    clock.set_time(spimf_core::TimeOfDay::new(18, 30).expect("time"));
    app.dispatch(Command::Tick).await.expect("tick");

    assert_eq!(app.ui().screen(), ScreenState::App);
    assert!(matches!(
        app.ui().availability,
        Some(spimf_ui::AvailabilityView::OpensAt(_))
    ));
}
