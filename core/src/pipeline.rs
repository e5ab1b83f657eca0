//! The per-request chain of interceptor and dispatch steps.
//!
//! # Design
//! A `Pipeline` is an ordered list of typed steps assembled from registry
//! snapshots:
//!
//! ```text
//! request[n-1] .. request[0] -> dispatch -> response[0] .. response[m-1]
//! ```
//!
//! Request interceptors run newest-first, response interceptors oldest-first.
//! The run is a fold over the steps carrying one `Result`: a fulfilled value
//! goes to the next fulfillment handler, a rejection goes to the next
//! rejection handler and skips every fulfillment handler in between. The
//! dispatch step has no rejection handler, so a rejected config never reaches
//! the transport.
//!
//! Dispatch races the transport against the request's cancel handle and its
//! timeout. Whichever fires first wins; an abort drops the transport future,
//! raises the abort signal handed to the transport, and rejects with the same
//! generic `TransportFailure` as a non-2xx status.

use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

use crate::cancel::{AbortController, AbortSignal, Cancellation};
use crate::config::{RequestConfig, Timeout};
use crate::error::{ClientError, Result};
use crate::http::TransportRequest;
use crate::interceptor::{Interceptor, Snapshot};
use crate::transport::Transport;

enum Step {
    Request(Arc<Interceptor<RequestConfig>>),
    Dispatch,
    Response(Arc<Interceptor<Value>>),
}

/// The value travelling through the fold: a config before dispatch, a
/// decoded response body after it.
enum Stage {
    Config(RequestConfig),
    Response(Value),
}

impl Step {
    async fn apply(&self, outcome: Result<Stage>, transport: &dyn Transport) -> Result<Stage> {
        match self {
            Step::Request(interceptor) => match outcome {
                Ok(Stage::Config(config)) => interceptor.apply(Ok(config)).await.map(Stage::Config),
                Err(reason) => interceptor.apply(Err(reason)).await.map(Stage::Config),
                passed => passed,
            },
            Step::Dispatch => match outcome {
                Ok(Stage::Config(config)) => dispatch(config, transport).await.map(Stage::Response),
                passed => passed,
            },
            Step::Response(interceptor) => match outcome {
                Ok(Stage::Response(value)) => {
                    interceptor.apply(Ok(value)).await.map(Stage::Response)
                }
                Err(reason) => interceptor.apply(Err(reason)).await.map(Stage::Response),
                passed => passed,
            },
        }
    }
}

/// One request's worth of steps. Built, run once, dropped.
pub struct Pipeline {
    steps: Vec<Step>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    pub fn assemble(
        request: &Snapshot<RequestConfig>,
        response: &Snapshot<Value>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let steps = request
            .iter()
            .rev()
            .cloned()
            .map(Step::Request)
            .chain(std::iter::once(Step::Dispatch))
            .chain(response.iter().cloned().map(Step::Response))
            .collect();
        Self { steps, transport }
    }

    /// Number of steps, the dispatch step included, so never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub async fn run(self, config: RequestConfig) -> Result<Value> {
        let span = debug_span!(
            "request",
            id = %Uuid::new_v4(),
            verb = ?config.verb,
            url = %config.url(),
        );
        async move {
            let mut outcome = Ok(Stage::Config(config));
            for step in &self.steps {
                outcome = step.apply(outcome, self.transport.as_ref()).await;
            }
            match outcome {
                Ok(Stage::Response(value)) => Ok(value),
                Ok(Stage::Config(_)) => Err(ClientError::invalid_config(
                    "pipeline finished without dispatching",
                )),
                Err(reason) => {
                    debug!(%reason, "request rejected");
                    Err(reason)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbortCause {
    Cancelled,
    TimedOut,
}

impl fmt::Display for AbortCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortCause::Cancelled => f.write_str("cancelled"),
            AbortCause::TimedOut => f.write_str("timed out"),
        }
    }
}

async fn abort_requested(cancel: Option<Cancellation>, timeout: Option<Duration>) -> AbortCause {
    let cancelled = async move {
        match cancel {
            Some(cancel) => cancel.requested().await,
            None => future::pending().await,
        }
    };
    let expired = async move {
        match timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => future::pending().await,
        }
    };
    tokio::select! {
        _ = cancelled => AbortCause::Cancelled,
        _ = expired => AbortCause::TimedOut,
    }
}

fn transport_request(config: &RequestConfig, abort: AbortSignal) -> Result<TransportRequest> {
    let method = config
        .verb
        .ok_or_else(|| ClientError::invalid_config("request reached dispatch without a verb"))?;
    let body = config
        .body
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ClientError::invalid_config(e.to_string()))?;
    let timeout_ms = match config.timeout_ms {
        Some(Timeout::Millis(ms)) if ms > 0 => Some(ms),
        _ => None,
    };
    Ok(TransportRequest {
        method,
        url: config.url(),
        headers: config
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
        body,
        timeout_ms,
        abort,
    })
}

/// JSON bodies are decoded, anything else is kept as text.
fn decode_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

fn abort(controller: &AbortController, cause: AbortCause) -> Result<Value> {
    controller.abort();
    warn!(%cause, "exchange aborted");
    Err(ClientError::TransportFailure)
}

async fn dispatch(config: RequestConfig, transport: &dyn Transport) -> Result<Value> {
    let controller = AbortController::new();
    let request = transport_request(&config, controller.signal())?;
    let timeout = config.timeout_ms.and_then(|timeout| timeout.duration());
    debug!(method = %request.method, url = %request.url, "dispatching");

    // The transport is polled first so it is always invoked exactly once,
    // even when the cancel handle fired before dispatch.
    let outcome = tokio::select! {
        biased;
        outcome = transport.execute(request) => outcome,
        cause = abort_requested(config.cancel.clone(), timeout) => {
            return abort(&controller, cause);
        }
    };
    // A transport that answered on its first poll still loses to a cancel
    // handle that had already fired.
    if config.cancel.as_ref().is_some_and(Cancellation::is_requested) {
        return abort(&controller, AbortCause::Cancelled);
    }

    match outcome {
        Ok(response) if response.is_success() => {
            debug!(status = response.status, "exchange succeeded");
            Ok(decode_body(response.body))
        }
        Ok(response) => {
            warn!(status = response.status, "exchange returned non-success status");
            Err(ClientError::TransportFailure)
        }
        Err(error) => {
            warn!(%error, "exchange failed");
            Err(ClientError::TransportFailure)
        }
    }
}
