//! Backend implementations owned by this crate.
//!
//! Only the discard sink lives here; the counter store and the analytical
//! engine are provided by their own services and registered on the
//! [`BackendRouter`](crate::routing::BackendRouter) by the caller.

pub mod sink;

pub use sink::SinkBackend;
