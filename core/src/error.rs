//! Error types for the request pipeline.
//!
//! # Design
//! Every rejection travelling through a pipeline is a `ClientError`. Transport
//! problems are deliberately flattened into `TransportFailure`: a non-2xx
//! status, a refused connection, an explicit cancel and a timeout all surface
//! with the same reason. The transport's own `TransportError` is logged by the
//! dispatch step and never reaches interceptors or callers.

use thiserror::Error;

/// Rejection reasons produced by merging, dispatching or interceptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A config value could not be merged or interpreted.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The exchange did not complete with a 2xx status. Carries no detail.
    #[error("request failed")]
    TransportFailure,

    /// A registered handler re-signalled a rejection.
    #[error("rejected by interceptor: {0}")]
    InterceptorRejection(String),
}

impl ClientError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        ClientError::InvalidConfig(msg.into())
    }

    pub fn rejection(reason: impl Into<String>) -> Self {
        ClientError::InterceptorRejection(reason.into())
    }
}

/// Failures reported by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange could not be performed (DNS, connect, I/O, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The exchange was abandoned after the abort signal fired.
    #[error("exchange aborted")]
    Aborted,
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failure_has_generic_reason() {
        assert_eq!(ClientError::TransportFailure.to_string(), "request failed");
    }

    #[test]
    fn constructors_wrap_messages() {
        assert_eq!(
            ClientError::invalid_config("bad verb"),
            ClientError::InvalidConfig("bad verb".to_string())
        );
        assert_eq!(
            ClientError::rejection("nope").to_string(),
            "rejected by interceptor: nope"
        );
    }
}
