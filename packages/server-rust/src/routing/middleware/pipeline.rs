//! Pipeline composition: wraps the `BackendRouter` in the dispatch middleware.

use tower::ServiceBuilder;

use super::metrics::MetricsLayer;
use super::timeout::TimeoutLayer;
use crate::routing::config::RouterConfig;
use crate::routing::operation::{Call, CallResponse, DispatchError};
use crate::routing::router::BackendRouter;

/// Build the dispatch pipeline around a `BackendRouter`.
///
/// Layer order (outermost to innermost):
/// 1. `TimeoutLayer` -- enforce per-call timeouts, defaulting to
///    `config.call_timeout_ms` for calls that carry none
/// 2. `MetricsLayer` -- record timing and outcome (closest to the router)
#[must_use]
pub fn build_dispatch_pipeline(
    router: BackendRouter,
    config: &RouterConfig,
) -> impl tower::Service<Call, Response = CallResponse, Error = DispatchError> {
    ServiceBuilder::new()
        .layer(TimeoutLayer::new(config.call_timeout_ms))
        .layer(MetricsLayer)
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
