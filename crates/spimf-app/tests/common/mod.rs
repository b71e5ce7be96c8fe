//! Shared fixtures for app integration tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use spimf_app::{AppConfig, AppController, ManualClock};
use spimf_core::{OperatingSchedule, TimeOfDay};
use spimf_transport::{ApiAction, ApiTransport, Payload, TransportError};

/// Scripted behavior for one call.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond immediately.
    Json(Value),
    /// Respond after a delay.
    Delayed(Duration, Value),
    /// Fail immediately.
    Error(TransportError),
    /// Never respond.
    Hang,
}

/// Transport answering each action from a queue; the last reply repeats.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<BTreeMap<&'static str, VecDeque<Reply>>>,
    calls: Mutex<Vec<(ApiAction, Payload)>>,
    completed: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Creates an empty script.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends a reply for `action`.
    pub fn push(&self, action: ApiAction, reply: Reply) {
        self.replies
            .lock()
            .expect("script lock")
            .entry(action.wire_name())
            .or_default()
            .push_back(reply);
    }

    /// Calls issued so far.
    pub fn calls(&self) -> Vec<(ApiAction, Payload)> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Number of calls issued for `action`.
    pub fn call_count(&self, action: ApiAction) -> usize {
        self.calls()
            .iter()
            .filter(|(called, _)| *called == action)
            .count()
    }

    /// Number of calls that ran to completion.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn next_reply(&self, action: ApiAction) -> Reply {
        let mut replies = self.replies.lock().expect("script lock");
        let queue = replies.entry(action.wire_name()).or_default();
        if queue.len() > 1 {
            queue.pop_front().expect("non-empty queue")
        } else {
            queue.front().cloned().unwrap_or(Reply::Hang)
        }
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn call(&self, action: ApiAction, payload: &Payload) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((action, payload.clone()));

        let result = match self.next_reply(action) {
            Reply::Json(value) => Ok(value),
            Reply::Delayed(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Reply::Error(error) => Err(error),
            Reply::Hang => std::future::pending().await,
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Valid config with the given operating hours and no jitter.
#[allow(dead_code)]
pub fn test_config(hours: &str) -> AppConfig {
    AppConfig {
        endpoint_url: "https://api.spimf.test/exec".to_string(),
        operating_hours: OperatingSchedule::parse_list(hours).expect("schedule fixture"),
        retry_jitter_ms: 0,
        ..AppConfig::default()
    }
}

/// Wall clock at `hh:mm` with epoch milliseconds starting at 1 000 000.
#[allow(dead_code)]
pub fn clock_at(hour: u8, minute: u8) -> Arc<ManualClock> {
    let time = TimeOfDay::new(hour, minute).expect("time fixture");
    Arc::new(ManualClock::new(time, 1_000_000))
}

/// Successful probe body.
#[allow(dead_code)]
pub fn probe_ok() -> Reply {
    Reply::Json(json!({"success": true, "connected": true}))
}

/// Successful login body for row 7.
#[allow(dead_code)]
pub fn login_ok() -> Reply {
    Reply::Json(json!({
        "success": true,
        "row": 7,
        "userData": {
            "YOUR NAME": "Aina Rahman",
            "STATUS ACCOUNT": "✅AKTIF",
            "PHONE NUMBER": "0123456789"
        }
    }))
}

/// Controller over `transport` at 09:00 inside `06:00-18:00`.
#[allow(dead_code)]
pub fn controller(transport: Arc<ScriptedTransport>) -> (AppController, Arc<ManualClock>) {
    let clock = clock_at(9, 0);
    let app = AppController::new(test_config("06:00-18:00"), transport, clock.clone());
    (app, clock)
}
