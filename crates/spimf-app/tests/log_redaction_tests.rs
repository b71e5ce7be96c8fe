//! Integration tests for log redaction.

mod common;

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{Reply, ScriptedTransport, controller};
use spimf_app::{Command, RequestController, redact_sensitive};
use spimf_transport::{ApiAction, Payload, TransportError};
use spimf_ui::ScreenState;
use tracing::subscriber::DefaultGuard;

/// Log sink shared between the subscriber and the assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn install(&self) -> DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn log_redaction_tests_removes_credential_values() {
    let raw = "login failed phone_number=0123456789 idCard=900101-14-5678 row=7";
    let redacted = redact_sensitive(raw);

    assert!(redacted.contains("phone_number=<redacted>"));
    assert!(redacted.contains("idCard=<redacted>"));
    assert!(redacted.contains("row=7"));
    assert!(!redacted.contains("0123456789"));
    assert!(!redacted.contains("900101"));
}

#[test]
fn log_redaction_tests_handles_json_style_keys() {
    let raw = r#"{"kodeUser": "SP-0042", "action": "login"}"#;
    let redacted = redact_sensitive(raw);

    assert!(!redacted.contains("SP-0042"));
    assert!(redacted.contains("login"));
}

#[tokio::test(start_paused = true)]
async fn log_redaction_tests_request_failure_log_hides_credentials() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::GetLogs,
        Reply::Error(TransportError::Network(
            "proxy echoed kodeUser=SP-0042 password=hunter2".to_string(),
        )),
    );
    let requests = RequestController::new(transport.clone(), Duration::from_secs(1));
    requests
        .execute(ApiAction::GetLogs, &Payload::new(), Duration::from_secs(5))
        .await;

    let text = logs.text();
    assert!(text.contains("request failed"));
    assert!(text.contains("kodeUser=<redacted>"));
    assert!(!text.contains("SP-0042"));
    assert!(!text.contains("hunter2"));
}

#[tokio::test(start_paused = true)]
async fn log_redaction_tests_connectivity_retry_logs_hide_credentials() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let transport = ScriptedTransport::new();
    transport.push(
        ApiAction::Probe,
        Reply::Error(TransportError::Network("gateway token=abc123 refused".to_string())),
    );
    let (mut app, _clock) = controller(transport.clone());
    app.dispatch(Command::Start).await.expect("start");

    assert_eq!(app.ui().screen(), ScreenState::Error);
    let text = logs.text();
    assert!(text.contains("connectivity probe gave up"));
    assert!(text.contains("token=<redacted>"));
    assert!(!text.contains("abc123"));
}
