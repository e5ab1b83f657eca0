//! Client bound to default configuration and its own interceptors.
//!
//! # Design
//! `Client` holds its defaults, two interceptor registries and a shared
//! transport behind an `Arc`, so clones are cheap and point at the same
//! registries. Defaults never change after construction: every request merges
//! against them, and [`Client::nested`] derives a new client from a merged
//! copy instead of mutating anything.
//!
//! Defaults carry no verb, path or body: those are stripped on the way in,
//! so a request without a verb is always sent as GET.
//!
//! A nested client starts with empty registries. Interceptors registered on
//! the parent, before or after nesting, never run for the child's requests.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::RequestConfig;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::interceptor::InterceptorRegistry;
use crate::merge::merge_config;
use crate::pipeline::Pipeline;
use crate::transport::Transport;

/// The request-phase and response-phase registries of one client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorRegistry<RequestConfig>,
    pub response: InterceptorRegistry<Value>,
}

struct Inner {
    defaults: RequestConfig,
    interceptors: Interceptors,
    transport: Arc<dyn Transport>,
}

/// HTTP client running every request through its interceptor pipeline.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a client over `transport` with the given defaults.
    pub fn create(defaults: RequestConfig, transport: impl Transport + 'static) -> Self {
        Self::from_parts(defaults, Arc::new(transport))
    }

    /// Create a client over `transport` with [`RequestConfig::client_defaults`].
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::create(RequestConfig::client_defaults(), transport)
    }

    /// Create a client over the bundled ureq transport.
    #[cfg(feature = "ureq")]
    pub fn with_defaults(defaults: RequestConfig) -> Self {
        Self::create(defaults, crate::transport::UreqTransport::new())
    }

    fn from_parts(defaults: RequestConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                defaults: defaults.into_defaults(),
                interceptors: Interceptors::default(),
                transport,
            }),
        }
    }

    pub fn defaults(&self) -> &RequestConfig {
        &self.inner.defaults
    }

    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// A new client whose defaults are this client's defaults merged with
    /// `overrides`. It shares the transport but none of the interceptors.
    pub fn nested(&self, overrides: RequestConfig) -> Result<Client> {
        let defaults = merge_config(&self.inner.defaults, &overrides)?;
        debug!(base_address = ?defaults.base_address, "nested client created");
        Ok(Self::from_parts(defaults, Arc::clone(&self.inner.transport)))
    }

    /// Merge `config` with the defaults and run it through the pipeline.
    ///
    /// A config without a verb is sent as GET.
    pub async fn request(&self, config: RequestConfig) -> Result<Value> {
        let mut effective = merge_config(&self.inner.defaults, &config)?;
        effective.verb.get_or_insert(HttpMethod::Get);

        let pipeline = Pipeline::assemble(
            &self.inner.interceptors.request.snapshot(),
            &self.inner.interceptors.response.snapshot(),
            Arc::clone(&self.inner.transport),
        );
        pipeline.run(effective).await
    }

    pub async fn get(&self, config: RequestConfig) -> Result<Value> {
        self.request(config.with_verb(HttpMethod::Get)).await
    }

    pub async fn post(&self, config: RequestConfig) -> Result<Value> {
        self.request(config.with_verb(HttpMethod::Post)).await
    }

    pub async fn put(&self, config: RequestConfig) -> Result<Value> {
        self.request(config.with_verb(HttpMethod::Put)).await
    }

    pub async fn delete(&self, config: RequestConfig) -> Result<Value> {
        self.request(config.with_verb(HttpMethod::Delete)).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.inner.defaults)
            .field("interceptors", &self.inner.interceptors)
            .finish()
    }
}
