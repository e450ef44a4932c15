//! Call dispatch: selects a backend for each `Call` and forwards it there.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tsdb_core::Backend;

use super::operation::{Call, CallResponse, DispatchError, RoutedCall};
use super::selector::BackendSelector;

// ---------------------------------------------------------------------------
// Boxed backend service
// ---------------------------------------------------------------------------

type BoxedFuture = Pin<Box<dyn Future<Output = Result<CallResponse, DispatchError>> + Send>>;

/// A boxed Tower service implementing one storage backend.
type BoxedBackend = Box<
    dyn Service<RoutedCall, Response = CallResponse, Error = DispatchError, Future = BoxedFuture>
        + Send,
>;

// ---------------------------------------------------------------------------
// BackendRouter
// ---------------------------------------------------------------------------

/// Routes each `Call` to the backend chosen by the [`BackendSelector`].
///
/// Selection failures are returned as `DispatchError::Select` without
/// touching any backend. A selected backend with no registered service
/// returns `DispatchError::UnknownBackend`.
pub struct BackendRouter {
    selector: Arc<BackendSelector>,
    backends: HashMap<Backend, BoxedBackend>,
}

impl BackendRouter {
    /// Create a router with no backends registered.
    #[must_use]
    pub fn new(selector: Arc<BackendSelector>) -> Self {
        Self {
            selector,
            backends: HashMap::new(),
        }
    }

    /// Register the service implementing `backend`, replacing any previous one.
    pub fn register<S>(&mut self, backend: Backend, service: S)
    where
        S: Service<RoutedCall, Response = CallResponse, Error = DispatchError> + Send + 'static,
        S::Future: Send + 'static,
    {
        self.backends.insert(backend, Box::new(BackendWrapper(service)));
    }

    #[must_use]
    pub fn selector(&self) -> &Arc<BackendSelector> {
        &self.selector
    }
}

impl Service<Call> for BackendRouter {
    type Response = CallResponse;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The target is only known per call, so every backend must be ready.
        for svc in self.backends.values_mut() {
            match svc.poll_ready(cx) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, call: Call) -> Self::Future {
        let decision = match self.selector.select(&call.method, &call.args) {
            Ok(decision) => decision,
            Err(err) => {
                return Box::pin(async move { Err::<CallResponse, _>(DispatchError::Select(err)) });
            }
        };
        let backend = decision.backend;
        match self.backends.get_mut(&backend) {
            Some(svc) => svc.call(RoutedCall { call, decision }),
            None => Box::pin(async move { Err(DispatchError::UnknownBackend { backend }) }),
        }
    }
}

// ---------------------------------------------------------------------------
// BackendWrapper (type-erased adapter)
// ---------------------------------------------------------------------------

/// Type-erases a concrete `Service<RoutedCall>` into a `BoxedBackend`.
struct BackendWrapper<S>(S);

impl<S> Service<RoutedCall> for BackendWrapper<S>
where
    S: Service<RoutedCall, Response = CallResponse, Error = DispatchError> + Send,
    S::Future: Send + 'static,
{
    type Response = CallResponse;
    type Error = DispatchError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.poll_ready(cx)
    }

    fn call(&mut self, routed: RoutedCall) -> Self::Future {
        Box::pin(self.0.call(routed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tower::ServiceExt;
    use tsdb_core::{ArgValue, CallArgs, Model};

    use super::*;
    use crate::routing::config::RouterConfig;
    use crate::routing::operation::SelectError;

    /// Answers every call with the backend's own name and records what it saw.
    #[derive(Clone)]
    struct StubBackend {
        name: &'static str,
        seen: Arc<Mutex<Vec<RoutedCall>>>,
    }

    impl StubBackend {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Service<RoutedCall> for StubBackend {
        type Response = CallResponse;
        type Error = DispatchError;
        type Future = BoxedFuture;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, routed: RoutedCall) -> Self::Future {
            let name = self.name;
            let call_id = routed.call.call_id;
            self.seen.lock().push(routed);
            Box::pin(async move {
                Ok(CallResponse::Data {
                    call_id,
                    payload: ArgValue::from(name),
                })
            })
        }
    }

    fn make_router() -> (BackendRouter, StubBackend, StubBackend) {
        let selector = Arc::new(BackendSelector::new(&RouterConfig::default()).unwrap());
        let counter = StubBackend::new("counter");
        let analytics = StubBackend::new("analytics");
        let mut router = BackendRouter::new(selector);
        router.register(Backend::Counter, counter.clone());
        router.register(Backend::Analytics, analytics.clone());
        (router, counter, analytics)
    }

    fn make_call(method: &str, args: CallArgs) -> Call {
        Call::new(7, method, args, 5000)
    }

    #[tokio::test]
    async fn routes_read_to_selected_backend() {
        let (router, counter, analytics) = make_router();
        let call = make_call("get_range", CallArgs::new().with("model", Model::Project));

        let resp = router.oneshot(call).await.unwrap();
        assert_eq!(
            resp,
            CallResponse::Data {
                call_id: 7,
                payload: ArgValue::from("analytics"),
            }
        );
        assert_eq!(analytics.seen.lock().len(), 1);
        assert!(counter.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn backend_receives_the_decision() {
        let (router, counter, _analytics) = make_router();
        let call = make_call("incr", CallArgs::new().with("model", Model::Internal));

        router.oneshot(call).await.unwrap();
        let seen = counter.seen.lock();
        assert_eq!(seen[0].call.method, "incr");
        assert_eq!(seen[0].decision.backend, Backend::Counter);
        assert!(!seen[0].decision.is_fallback());
    }

    #[tokio::test]
    async fn unspecified_method_reaches_default_backend_as_fallback() {
        let (router, counter, _analytics) = make_router();
        let call = make_call("unsupported_op", CallArgs::new());

        router.oneshot(call).await.unwrap();
        let seen = counter.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].decision.is_fallback());
    }

    #[tokio::test]
    async fn selection_failure_never_reaches_a_backend() {
        let (router, counter, analytics) = make_router();
        let call = make_call(
            "delete",
            CallArgs::new().with("models", vec![Model::Project, Model::Internal]),
        );

        let err = router.oneshot(call).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Select(SelectError::SplitBackendRouting { .. })
        ));
        assert!(counter.seen.lock().is_empty());
        assert!(analytics.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn forbidden_method_is_rejected() {
        let (router, _counter, _analytics) = make_router();
        let err = router
            .oneshot(make_call("flush", CallArgs::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Select(SelectError::ForbiddenOperation { ref method }) if method == "flush"
        ));
    }

    #[tokio::test]
    async fn unregistered_backend_returns_error() {
        let (router, _counter, _analytics) = make_router();
        // Writes to analytics-backed models go to the sink, which is not registered here.
        let call = make_call("incr", CallArgs::new().with("model", Model::Group));

        let err = router.oneshot(call).await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnknownBackend {
                backend: Backend::Sink
            }
        ));
    }
}
