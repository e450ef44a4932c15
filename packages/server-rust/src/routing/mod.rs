//! Backend selection and call dispatch.
//!
//! This module implements the routing pipeline for the time-series storage
//! abstraction:
//!
//! 1. **Model registry** (`registry`): `Model` -> read/write `Backend`
//! 2. **Method table** (`spec`): method name -> operation kind + model extractor
//! 3. **Selection** (`selector`): `(method, args)` -> `Result<RoutingDecision, SelectError>`
//! 4. **Dispatch** (`router`): forwards each `Call` to the selected backend service
//! 5. **Middleware** (`middleware`): Tower layers (timeout, metrics)

pub mod config;
pub mod middleware;
pub mod operation;
pub mod registry;
pub mod router;
pub mod selector;
pub mod spec;

// Re-export key types for convenient access.
pub use config::RouterConfig;
pub use operation::{
    Call, CallResponse, DispatchError, ExtractError, RoutedCall, RoutingDecision, SelectError,
    SpecError, Verdict,
};
pub use registry::{BackendPair, ModelColumns, ModelRegistry};
pub use router::BackendRouter;
pub use selector::BackendSelector;
pub use spec::{MethodTable, ModelExtractor, OperationSpec, METHOD_SPECIFICATIONS};
