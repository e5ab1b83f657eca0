//! Interceptor handler pairs and the append-only registry holding them.
//!
//! # Design
//! A registry is written rarely and read on every request. Registration swaps
//! in a new list (copy-on-write); a pipeline takes the current list with one
//! atomic load and keeps it for its whole run, so handlers registered while a
//! request is in flight only apply to later requests.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::error::{ClientError, Result};

type Fulfilled<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T>> + Send + Sync>;
type Rejected<T> = Arc<dyn Fn(ClientError) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// A (fulfillment, rejection) handler pair.
///
/// A missing half passes its input through unchanged: values continue on the
/// fulfilled path, rejections keep propagating.
pub struct Interceptor<T> {
    on_fulfilled: Option<Fulfilled<T>>,
    on_rejected: Option<Rejected<T>>,
}

impl<T: Send + 'static> Interceptor<T> {
    /// A pair with neither half set.
    pub fn new() -> Self {
        Self {
            on_fulfilled: None,
            on_rejected: None,
        }
    }

    pub fn on_fulfilled<F>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
    {
        let handler: Fulfilled<T> = Arc::new(move |value: T| future::ready(handler(value)).boxed());
        self.on_fulfilled = Some(handler);
        self
    }

    pub fn on_fulfilled_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let handler: Fulfilled<T> = Arc::new(move |value: T| handler(value).boxed());
        self.on_fulfilled = Some(handler);
        self
    }

    /// Return `Ok` to recover, `Err` to keep the chain rejected.
    pub fn on_rejected<F>(mut self, handler: F) -> Self
    where
        F: Fn(ClientError) -> Result<T> + Send + Sync + 'static,
    {
        let handler: Rejected<T> =
            Arc::new(move |reason: ClientError| future::ready(handler(reason)).boxed());
        self.on_rejected = Some(handler);
        self
    }

    pub fn on_rejected_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ClientError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let handler: Rejected<T> = Arc::new(move |reason: ClientError| handler(reason).boxed());
        self.on_rejected = Some(handler);
        self
    }

    /// Run whichever half matches the incoming outcome.
    pub(crate) async fn apply(&self, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => match &self.on_fulfilled {
                Some(handler) => handler(value).await,
                None => Ok(value),
            },
            Err(reason) => match &self.on_rejected {
                Some(handler) => handler(reason).await,
                None => Err(reason),
            },
        }
    }
}

impl<T: Send + 'static> Default for Interceptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

/// Ordered list of handler pairs, in registration order.
pub type Snapshot<T> = Arc<Vec<Arc<Interceptor<T>>>>;

/// Append-only registry of interceptors for one phase of a client.
pub struct InterceptorRegistry<T> {
    handlers: ArcSwap<Vec<Arc<Interceptor<T>>>>,
}

impl<T: Send + 'static> InterceptorRegistry<T> {
    pub fn new() -> Self {
        Self {
            handlers: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Append a handler pair. There is no way to remove or reorder it.
    pub fn register(&self, interceptor: Interceptor<T>) {
        let handler = Arc::new(interceptor);
        self.handlers.rcu(|current| {
            let mut next = current.to_vec();
            next.push(Arc::clone(&handler));
            next
        });
    }

    /// Shorthand for registering a synchronous pair with both halves set.
    pub fn register_pair<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
        R: Fn(ClientError) -> Result<T> + Send + Sync + 'static,
    {
        self.register(
            Interceptor::new()
                .on_fulfilled(on_fulfilled)
                .on_rejected(on_rejected),
        );
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.handlers.load_full()
    }

    pub fn len(&self) -> usize {
        self.handlers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Send + 'static> Default for InterceptorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InterceptorRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("len", &self.handlers.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_pair_passes_everything_through() {
        let pair = Interceptor::<i32>::new();
        assert_eq!(pair.apply(Ok(3)).await, Ok(3));
        assert_eq!(
            pair.apply(Err(ClientError::TransportFailure)).await,
            Err(ClientError::TransportFailure)
        );
    }

    #[tokio::test]
    async fn fulfilled_half_transforms_values_only() {
        let pair = Interceptor::<i32>::new().on_fulfilled(|v| Ok(v * 2));
        assert_eq!(pair.apply(Ok(4)).await, Ok(8));
        assert_eq!(
            pair.apply(Err(ClientError::TransportFailure)).await,
            Err(ClientError::TransportFailure)
        );
    }

    #[tokio::test]
    async fn rejected_half_can_recover() {
        let pair = Interceptor::<i32>::new().on_rejected(|_| Ok(0));
        assert_eq!(pair.apply(Err(ClientError::TransportFailure)).await, Ok(0));
        assert_eq!(pair.apply(Ok(7)).await, Ok(7));
    }

    #[tokio::test]
    async fn async_halves_are_awaited() {
        let pair = Interceptor::<i32>::new()
            .on_fulfilled_async(|v| async move {
                tokio::task::yield_now().await;
                Ok(v + 1)
            })
            .on_rejected_async(|reason| async move {
                Err(ClientError::rejection(reason.to_string()))
            });
        assert_eq!(pair.apply(Ok(1)).await, Ok(2));
        assert_eq!(
            pair.apply(Err(ClientError::TransportFailure)).await,
            Err(ClientError::rejection("request failed"))
        );
    }

    #[test]
    fn registry_keeps_registration_order() {
        let registry = InterceptorRegistry::<i32>::new();
        assert!(registry.is_empty());
        registry.register(Interceptor::new().on_fulfilled(|v| Ok(v + 1)));
        registry.register_pair(|v| Ok(v * 10), Err);
        assert_eq!(registry.len(), 2);

        let snapshot = registry.snapshot();
        assert!(snapshot[0].on_fulfilled.is_some());
        assert!(snapshot[0].on_rejected.is_none());
        assert!(snapshot[1].on_rejected.is_some());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_registration() {
        let registry = InterceptorRegistry::<i32>::new();
        registry.register(Interceptor::new());
        let snapshot = registry.snapshot();

        registry.register(Interceptor::new());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.snapshot().len(), 2);
    }
}
