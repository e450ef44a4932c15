//! Backend-selection router for the multi-model time-series storage abstraction.

pub mod backends;
pub mod routing;
pub mod traits;

pub use routing::{BackendRouter, BackendSelector, RouterConfig, RoutingDecision, SelectError};
pub use traits::AnalyticsCapability;
