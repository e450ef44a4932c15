//! Tower middleware layers for the dispatch pipeline.
//!
//! - [`timeout`]: Per-call timeout enforcement
//! - [`metrics`]: Call timing and outcome via `tracing` spans and `metrics`
//! - [`pipeline`]: Composes all layers around the router

pub mod metrics;
pub mod pipeline;
pub mod timeout;

pub use metrics::MetricsLayer;
pub use pipeline::build_dispatch_pipeline;
pub use timeout::TimeoutLayer;
