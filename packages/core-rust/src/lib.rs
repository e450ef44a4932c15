//! Time-series storage core: models, backends, call arguments, and the
//! operation surface shared by every storage backend.

pub mod args;
pub mod surface;
pub mod types;

pub use args::{ArgValue, CallArgs};
pub use types::{Backend, Model, OperationKind, ParseBackendError, ParseModelError};
