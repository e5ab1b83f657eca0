//! Minimal HTTP client runtime built around an interceptor pipeline.
//!
//! # Overview
//! A [`Client`] merges each request with its defaults, runs the result
//! through its request interceptors (newest first), hands it to a
//! [`Transport`], and runs the decoded response through its response
//! interceptors (oldest first). The caller gets back either the final value
//! or the rejection that reached the end of the chain.
//!
//! # Design
//! - Configs are merged structurally through their JSON shape
//!   ([`merge`](merge::merge)); unset fields never override.
//! - Interceptor registries are append-only and read as snapshots, so
//!   registering while requests are in flight is safe.
//! - The transport is an async trait object. It only moves bytes; status
//!   interpretation, body decoding, timeouts and cancellation live in the
//!   dispatch step.
//! - Every transport failure surfaces as the same generic
//!   [`ClientError::TransportFailure`].

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod merge;
pub mod pipeline;
pub mod transport;

pub use cancel::{AbortController, AbortSignal, CancelToken, Canceler, Cancellation};
pub use client::{Client, Interceptors};
pub use config::{RequestConfig, Timeout};
pub use error::{ClientError, TransportError};
pub use http::{HttpMethod, TransportRequest, TransportResponse};
pub use interceptor::{Interceptor, InterceptorRegistry};
pub use merge::{merge, merge_config};
pub use pipeline::Pipeline;
pub use transport::{transport_fn, FnTransport, Transport};

#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
