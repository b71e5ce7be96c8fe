//! Request lifecycle: one call, one deadline, one outcome.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use spimf_api_contract::{ApiResponse, ResponseVerdict, evaluate_response};
use spimf_transport::{
    ApiAction, ApiTransport, FailureClass, Payload, TransportError, classify_transport_error,
    request_fingerprint,
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::countdown::{Countdown, CountdownTick};
use crate::telemetry::redact_sensitive;

/// Why a request did not succeed before its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Transport failure or unusable response body.
    Network {
        /// Diagnostic text.
        message: String,
        /// Whether another attempt may succeed.
        retriable: bool,
    },
    /// Well-formed refusal from the server.
    Application {
        /// Server message, verbatim.
        message: String,
        /// Account suspension flag.
        banned: bool,
    },
}

impl FailureReason {
    /// User-facing text.
    pub fn message(&self) -> &str {
        match self {
            Self::Network { message, .. } | Self::Application { message, .. } => message,
        }
    }

    /// Returns `true` when a retry may help.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Network { retriable: true, .. })
    }
}

/// Result of one logical request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Accepted response.
    Success(ApiResponse),
    /// Failed before the deadline.
    Failure(FailureReason),
    /// No response by the deadline; the call was cancelled.
    Timeout,
}

impl RequestOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(FailureReason::Network { .. }) => "network_failure",
            Self::Failure(FailureReason::Application { .. }) => "application_failure",
            Self::Timeout => "timeout",
        }
    }
}

/// Wraps the transport with a hard deadline and optional countdown.
#[derive(Clone)]
pub struct RequestController {
    transport: Arc<dyn ApiTransport>,
    tick_granularity: Duration,
}

impl RequestController {
    /// Creates a controller ticking every `tick_granularity` when a countdown
    /// is requested.
    pub fn new(transport: Arc<dyn ApiTransport>, tick_granularity: Duration) -> Self {
        Self {
            transport,
            tick_granularity,
        }
    }

    /// Issues one request and waits at most `timeout`.
    pub async fn execute(&self, action: ApiAction, payload: &Payload, timeout: Duration) -> RequestOutcome {
        self.run(action, payload, timeout, timeout, |_| {}).await
    }

    /// Like [`Self::execute`], reporting countdown ticks to `on_tick`.
    ///
    /// Ticks strictly decrease and end either with the outcome or with a zero
    /// tick at the deadline, whichever comes first.
    pub async fn execute_with_countdown<F>(
        &self,
        action: ApiAction,
        payload: &Payload,
        timeout: Duration,
        on_tick: F,
    ) -> RequestOutcome
    where
        F: FnMut(CountdownTick),
    {
        self.run(action, payload, timeout, self.tick_granularity, on_tick)
            .await
    }

    async fn run<F>(
        &self,
        action: ApiAction,
        payload: &Payload,
        timeout: Duration,
        granularity: Duration,
        mut on_tick: F,
    ) -> RequestOutcome
    where
        F: FnMut(CountdownTick),
    {
        let started = Instant::now();
        let fingerprint = request_fingerprint(action, payload);
        let mut countdown = Countdown::start(timeout, granularity);

        // Dropping `call` on return aborts the in-flight request.
        let call = self.transport.call(action, payload);
        tokio::pin!(call);

        let outcome = loop {
            tokio::select! {
                biased;
                result = &mut call => break classify(action, result),
                tick = countdown.tick() => match tick {
                    Some(tick) => {
                        on_tick(tick);
                        if tick.is_deadline() {
                            break RequestOutcome::Timeout;
                        }
                    }
                    None => break RequestOutcome::Timeout,
                },
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            RequestOutcome::Success(_) => {
                info!(%action, %fingerprint, elapsed_ms, outcome = outcome.label(), "request completed");
            }
            RequestOutcome::Failure(reason) => {
                warn!(
                    %action,
                    %fingerprint,
                    elapsed_ms,
                    outcome = outcome.label(),
                    reason = %redact_sensitive(reason.message()),
                    "request failed"
                );
            }
            RequestOutcome::Timeout => {
                warn!(
                    %action,
                    %fingerprint,
                    elapsed_ms,
                    timeout_ms = timeout.as_millis() as u64,
                    outcome = outcome.label(),
                    "request deadline exceeded"
                );
            }
        }
        outcome
    }
}

fn classify(action: ApiAction, result: Result<Value, TransportError>) -> RequestOutcome {
    let raw = match result {
        Ok(raw) => raw,
        Err(error) => {
            return RequestOutcome::Failure(FailureReason::Network {
                retriable: classify_transport_error(&error) == FailureClass::Retriable,
                message: error.to_string(),
            });
        }
    };

    match evaluate_response(action, raw) {
        Ok(ResponseVerdict::Accepted(response)) => RequestOutcome::Success(response),
        Ok(ResponseVerdict::Rejected { message, banned }) => {
            RequestOutcome::Failure(FailureReason::Application { message, banned })
        }
        Err(error) => RequestOutcome::Failure(FailureReason::Network {
            message: format!("invalid response: {error}"),
            retriable: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn contract_violation_is_a_permanent_network_failure() {
        let outcome = classify(ApiAction::Login, Ok(json!({"success": true})));
        match outcome {
            RequestOutcome::Failure(reason) => {
                assert!(!reason.is_retriable());
                assert!(reason.message().starts_with("invalid response"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_retriable() {
        let outcome = classify(ApiAction::Probe, Err(TransportError::Status(502)));
        assert!(matches!(
            outcome,
            RequestOutcome::Failure(FailureReason::Network { retriable: true, .. })
        ));
    }
}
