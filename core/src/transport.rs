//! The transport contract and the bundled ureq transport.
//!
//! # Design
//! A transport performs one exchange and reports what came back, whatever the
//! status. It does not decide success, parse bodies, or arm timers: the
//! dispatch step in [`crate::pipeline`] does all of that and races the
//! returned future against cancellation, dropping it on abort.
//!
//! Any async function with the right shape is a transport through
//! [`transport_fn`], which is what the tests use.

use std::future::Future;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{TransportRequest, TransportResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange described by `request`.
    ///
    /// Non-2xx responses are returned as `Ok`; `Err` is reserved for
    /// exchanges that produced no response at all.
    async fn execute(&self, request: TransportRequest)
        -> Result<TransportResponse, TransportError>;
}

/// Adapter turning an async function into a [`Transport`].
pub struct FnTransport<F> {
    exchange: F,
}

pub fn transport_fn<F, Fut>(exchange: F) -> FnTransport<F>
where
    F: Fn(TransportRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TransportResponse, TransportError>> + Send + 'static,
{
    FnTransport { exchange }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(TransportRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TransportResponse, TransportError>> + Send + 'static,
{
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        (self.exchange)(request).await
    }
}

#[cfg(feature = "ureq")]
mod ureq_impl {
    use std::time::Duration;

    use tracing::trace;

    use super::*;
    use crate::http::HttpMethod;

    /// Blocking ureq agent driven from tokio's blocking pool.
    ///
    /// An exchange that is already in flight is not aborted. Cancelling the
    /// request rejects it at once, but the blocking thread keeps running the
    /// exchange until ureq returns, and a POST or PUT body is still delivered.
    /// The abort signal is only checked before the exchange starts. The
    /// request's `timeout_ms` is applied as ureq's global timeout, so the
    /// thread is bounded only when a timeout was configured.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for UreqTransport {
        async fn execute(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            let agent = self.agent.clone();
            tokio::task::spawn_blocking(move || exchange(&agent, request))
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?
        }
    }

    fn prepare<B>(
        mut builder: ureq::RequestBuilder<B>,
        request: &TransportRequest,
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ms) = request.timeout_ms.filter(|ms| *ms > 0) {
            builder = builder
                .config()
                .timeout_global(Some(Duration::from_millis(ms)))
                .build();
        }
        builder
    }

    fn exchange(
        agent: &ureq::Agent,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if request.abort.is_aborted() {
            return Err(TransportError::Aborted);
        }
        trace!(method = %request.method, url = %request.url, "ureq exchange");

        let url = request.url.as_str();
        let body = request.body.as_deref();
        let outcome = match request.method {
            HttpMethod::Get => prepare(agent.get(url), &request).call(),
            HttpMethod::Delete => prepare(agent.delete(url), &request).call(),
            HttpMethod::Post => {
                let builder = prepare(agent.post(url), &request);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Put => {
                let builder = prepare(agent.put(url), &request);
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = outcome.map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(feature = "ureq")]
pub use ureq_impl::UreqTransport;
