//! Metrics middleware for dispatched calls.
//!
//! Wraps each call in a `dispatch` tracing span and records its duration in
//! the `tsdb_router_dispatch_duration_ms` histogram, labelled by outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::routing::operation::{Call, CallResponse, DispatchError};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments calls with timing and outcome.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records call duration and outcome.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

/// Label for a dispatch result.
fn outcome(result: &Result<CallResponse, DispatchError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DispatchError::Select(err)) => err.reason(),
        Err(DispatchError::UnknownBackend { .. }) => "unknown_backend",
        Err(DispatchError::Timeout { .. }) => "timeout",
        Err(DispatchError::Internal(_)) => "internal",
    }
}

impl<S> Service<Call> for MetricsService<S>
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
        let method = call.method.clone();
        let call_id = call.call_id;

        let span = info_span!(
            "dispatch",
            method = %method,
            call_id = call_id,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        // Selection happens inside the inner call, so time and trace it too.
        let start = Instant::now();
        let fut = span.in_scope(|| self.inner.call(call));

        Box::pin(
            async move {
                let result = fut.await;
                let elapsed = start.elapsed();
                let label = outcome(&result);

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);
                tracing::Span::current().record("outcome", label);

                ::metrics::histogram!("tsdb_router_dispatch_duration_ms", "outcome" => label)
                    .record(elapsed.as_secs_f64() * 1000.0);
                tracing::info!(
                    method = %method,
                    call_id = call_id,
                    duration_ms = duration_ms,
                    outcome = label,
                    "call complete"
                );

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tower::ServiceExt;
    use tsdb_core::CallArgs;

    use super::*;
    use crate::routing::operation::SelectError;

    /// Immediately-completing service for metrics testing.
    struct ImmediateService;

    impl Service<Call> for ImmediateService {
        type Response = CallResponse;
        type Error = DispatchError;
        type Future =
            Pin<Box<dyn Future<Output = Result<CallResponse, DispatchError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, call: Call) -> Self::Future {
            let call_id = call.call_id;
            Box::pin(async move { Ok(CallResponse::Ack { call_id }) })
        }
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_response() {
        let svc = MetricsLayer.layer(ImmediateService);
        let call = Call::new(42, "incr", CallArgs::new(), 5000);

        let resp = svc.oneshot(call).await.unwrap();
        assert_eq!(resp, CallResponse::Ack { call_id: 42 });
    }

    #[test]
    fn outcome_labels_follow_error_kind() {
        assert_eq!(outcome(&Ok(CallResponse::Ack { call_id: 1 })), "ok");
        assert_eq!(
            outcome(&Err(DispatchError::Select(SelectError::ForbiddenOperation {
                method: "flush".to_string(),
            }))),
            "forbidden"
        );
        assert_eq!(
            outcome(&Err(DispatchError::Timeout {
                method: "get_range".to_string(),
                timeout_ms: 1,
            })),
            "timeout"
        );
    }
}
