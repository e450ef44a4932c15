//! No-op backend.
//!
//! [`SinkBackend`] acknowledges and drops every write and answers every read
//! with nothing. Models whose data is ingested through a separate path have
//! their writes routed here.

use std::future::{ready, Ready};
use std::task::{Context, Poll};

use tower::Service;
use tracing::trace;
use tsdb_core::OperationKind;

use crate::routing::operation::{CallResponse, DispatchError, RoutedCall};

/// Backend that discards writes and returns empty reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkBackend;

impl Service<RoutedCall> for SinkBackend {
    type Response = CallResponse;
    type Error = DispatchError;
    type Future = Ready<Result<CallResponse, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, routed: RoutedCall) -> Self::Future {
        let call_id = routed.call.call_id;
        trace!(method = %routed.call.method, call_id, "sink discarding call");
        // Fallback decisions carry no kind; treat them like reads.
        let response = match routed.decision.kind() {
            Some(OperationKind::Write) => CallResponse::Ack { call_id },
            Some(OperationKind::Read) | None => CallResponse::Empty { call_id },
        };
        ready(Ok(response))
    }
}
