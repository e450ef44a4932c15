//! Deadline enforcement for dispatched calls.
//!
//! A call's own `call_timeout_ms` wins; `0` means "no budget given" and the
//! router-wide default from `RouterConfig::call_timeout_ms` applies.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tower::{Layer, Service};
use tracing::warn;

use crate::routing::operation::{Call, CallResponse, DispatchError};

/// Tower layer applying a per-call deadline with a router-wide default.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    default_timeout_ms: u64,
}

impl TimeoutLayer {
    #[must_use]
    pub const fn new(default_timeout_ms: u64) -> Self {
        Self { default_timeout_ms }
    }

    /// Budget for `call`: its own timeout, or the default when it carries none.
    #[must_use]
    pub const fn budget_for(&self, call: &Call) -> u64 {
        if call.call_timeout_ms == 0 {
            self.default_timeout_ms
        } else {
            call.call_timeout_ms
        }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            layer: *self,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    layer: TimeoutLayer,
}

impl<S> Service<Call> for TimeoutService<S>
where
    S: Service<Call, Response = CallResponse, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = CallResponse;
    type Error = DispatchError;
    type Future = Pin<Box<dyn Future<Output = Result<CallResponse, DispatchError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: Call) -> Self::Future {
        let timeout_ms = self.layer.budget_for(&call);
        let method = call.method.clone();
        let fut = self.inner.call(call);
        Box::pin(async move {
            if let Ok(result) = tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
                return result;
            }
            warn!(method = %method, timeout_ms, "backend call exceeded its deadline");
            Err(DispatchError::Timeout { method, timeout_ms })
        })
    }
}

#[cfg(test)]
mod tests {
    use tower::ServiceExt;
    use tsdb_core::CallArgs;

    use super::*;

    /// Backend stand-in that answers after `delay_ms`.
    #[derive(Clone, Copy)]
    struct Delayed {
        delay_ms: u64,
    }

    impl Service<Call> for Delayed {
        type Response = CallResponse;
        type Error = DispatchError;
        type Future =
            Pin<Box<dyn Future<Output = Result<CallResponse, DispatchError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, call: Call) -> Self::Future {
            let delay = Duration::from_millis(self.delay_ms);
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(CallResponse::Empty {
                    call_id: call.call_id,
                })
            })
        }
    }

    fn get_range(call_timeout_ms: u64) -> Call {
        Call::new(1, "get_range", CallArgs::new(), call_timeout_ms)
    }

    #[test]
    fn call_budget_overrides_default() {
        let layer = TimeoutLayer::new(30_000);
        assert_eq!(layer.budget_for(&get_range(250)), 250);
        assert_eq!(layer.budget_for(&get_range(0)), 30_000);
    }

    #[tokio::test(start_paused = true)]
    async fn fast_backend_answers() {
        let svc = TimeoutLayer::new(1_000).layer(Delayed { delay_ms: 10 });
        let resp = svc.oneshot(get_range(0)).await.unwrap();
        assert_eq!(resp, CallResponse::Empty { call_id: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_with_method() {
        let svc = TimeoutLayer::new(30_000).layer(Delayed { delay_ms: 200 });
        let err = svc.oneshot(get_range(50)).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Timeout { ref method, timeout_ms: 50 } if method == "get_range"
        ));
        assert_eq!(err.to_string(), "call to `get_range` timed out after 50ms");
    }

    #[tokio::test(start_paused = true)]
    async fn call_without_budget_uses_default() {
        let svc = TimeoutLayer::new(100).layer(Delayed { delay_ms: 500 });
        let err = svc.oneshot(get_range(0)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { timeout_ms: 100, .. }));
    }
}
