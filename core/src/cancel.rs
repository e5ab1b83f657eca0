//! One-shot cooperative cancellation.
//!
//! Two flavours exist and behave the same way once attached to a request:
//! - [`CancelToken`]: built from an executor that receives the trigger, or
//!   split into a token/trigger pair with [`CancelToken::source`].
//! - [`AbortController`]: owns an [`AbortSignal`] and raises it on `abort()`.
//!
//! Both are backed by a latch that can only move from "armed" to "fired".
//! Firing twice is a no-op. Waiters registered before or after the latch
//! fires all observe it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone)]
struct Latch {
    tx: Arc<watch::Sender<bool>>,
}

impl Latch {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Returns `true` only for the call that actually fired the latch.
    fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        // The sender is kept alive by `tx`, so `wait_for` only returns once
        // the value flips.
        let tx = Arc::clone(&self.tx);
        async move {
            let mut rx = tx.subscribe();
            let _ = rx.wait_for(|fired| *fired).await;
        }
    }

    fn same(&self, other: &Latch) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

// ---------------------------------------------------------------------------
// Cancel token
// ---------------------------------------------------------------------------

/// A cancellation request that can be attached to a
/// [`RequestConfig`](crate::config::RequestConfig).
#[derive(Debug, Clone)]
pub struct CancelToken {
    latch: Latch,
}

/// The trigger side of a [`CancelToken`].
#[derive(Debug, Clone)]
pub struct Canceler {
    latch: Latch,
}

impl CancelToken {
    /// Create a token and hand its trigger to `executor`.
    ///
    /// The executor runs synchronously; it typically stores the [`Canceler`]
    /// somewhere the caller can reach later.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Canceler),
    {
        let (token, canceler) = Self::source();
        executor(canceler);
        token
    }

    pub fn source() -> (Self, Canceler) {
        let latch = Latch::new();
        (
            Self {
                latch: latch.clone(),
            },
            Canceler { latch },
        )
    }

    pub fn is_cancelled(&self) -> bool {
        self.latch.is_fired()
    }

    /// Resolves once cancellation has been requested. Resolves immediately if
    /// it already was.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + 'static {
        self.latch.wait()
    }
}

impl Canceler {
    pub fn cancel(&self) {
        if self.latch.fire() {
            debug!("cancellation requested");
        }
    }
}

// ---------------------------------------------------------------------------
// Abort controller
// ---------------------------------------------------------------------------

/// Owner of an [`AbortSignal`].
#[derive(Debug, Clone)]
pub struct AbortController {
    latch: Latch,
}

/// Observer side of an [`AbortController`].
#[derive(Debug, Clone)]
pub struct AbortSignal {
    latch: Latch,
}

impl AbortController {
    pub fn new() -> Self {
        Self {
            latch: Latch::new(),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            latch: self.latch.clone(),
        }
    }

    pub fn abort(&self) {
        if self.latch.fire() {
            debug!("abort signalled");
        }
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        self.latch.is_fired()
    }

    pub fn aborted(&self) -> impl Future<Output = ()> + Send + 'static {
        self.latch.wait()
    }
}

// ---------------------------------------------------------------------------
// Request-level handle
// ---------------------------------------------------------------------------

/// The cancellation handle a request may carry.
#[derive(Debug, Clone)]
pub enum Cancellation {
    Token(CancelToken),
    Signal(AbortSignal),
}

impl Cancellation {
    pub fn is_requested(&self) -> bool {
        match self {
            Cancellation::Token(token) => token.is_cancelled(),
            Cancellation::Signal(signal) => signal.is_aborted(),
        }
    }

    /// Resolves once the underlying token or signal fires.
    pub fn requested(&self) -> impl Future<Output = ()> + Send + 'static {
        match self {
            Cancellation::Token(token) => token.latch.wait(),
            Cancellation::Signal(signal) => signal.latch.wait(),
        }
    }
}

/// Two handles are equal when they observe the same latch.
impl PartialEq for Cancellation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cancellation::Token(a), Cancellation::Token(b)) => a.latch.same(&b.latch),
            (Cancellation::Signal(a), Cancellation::Signal(b)) => a.latch.same(&b.latch),
            _ => false,
        }
    }
}

impl From<CancelToken> for Cancellation {
    fn from(token: CancelToken) -> Self {
        Cancellation::Token(token)
    }
}

impl From<AbortSignal> for Cancellation {
    fn from(signal: AbortSignal) -> Self {
        Cancellation::Signal(signal)
    }
}
