//! Call, decision, and error types shared by the selector and dispatcher.

use std::collections::BTreeSet;

use serde::Serialize;
use tsdb_core::{ArgValue, Backend, CallArgs, Model, OperationKind};

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// One invocation of a storage method, as handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct Call {
    pub call_id: u64,
    pub method: String,
    pub args: CallArgs,
    pub call_timeout_ms: u64,
}

impl Call {
    #[must_use]
    pub fn new(call_id: u64, method: impl Into<String>, args: CallArgs, call_timeout_ms: u64) -> Self {
        Self {
            call_id,
            method: method.into(),
            args,
            call_timeout_ms,
        }
    }
}

/// A call together with the decision that routed it; what backends receive.
#[derive(Debug, Clone)]
pub struct RoutedCall {
    pub call: Call,
    pub decision: RoutingDecision,
}

/// Successful response from a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResponse {
    /// Write accepted.
    Ack { call_id: u64 },
    /// Read answered with no data.
    Empty { call_id: u64 },
    /// Read answered with data.
    Data { call_id: u64, payload: ArgValue },
}

// ---------------------------------------------------------------------------
// RoutingDecision
// ---------------------------------------------------------------------------

/// How a backend was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Chosen from the method table; every involved model agreed on it.
    Verified {
        kind: OperationKind,
        models: BTreeSet<Model>,
    },
    /// The method has no specification; the configured default was used and
    /// nothing about consistency was checked.
    Fallback,
}

impl Verdict {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Verdict::Verified { .. } => "verified",
            Verdict::Fallback => "fallback",
        }
    }
}

/// Outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    pub backend: Backend,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl RoutingDecision {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self.verdict, Verdict::Fallback)
    }

    /// Kind of the routed operation; unknown for fallback decisions.
    #[must_use]
    pub fn kind(&self) -> Option<OperationKind> {
        match &self.verdict {
            Verdict::Verified { kind, .. } => Some(*kind),
            Verdict::Fallback => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Method table and operation manifest disagree. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    #[error(
        "all read and write methods must have a specification defined \
         (unspecified: {unspecified:?}, retired: {retired:?})"
    )]
    MissingSpecification {
        /// Exposed by the storage abstraction but absent from the table.
        unspecified: Vec<String>,
        /// Present in the table but no longer exposed.
        retired: Vec<String>,
    },
    #[error("methods specified more than once: {methods:?}")]
    DuplicateSpecification { methods: Vec<String> },
    #[error("method `{method}` is declared as {declared} but specified as {specified}")]
    KindMismatch {
        method: String,
        declared: OperationKind,
        specified: OperationKind,
    },
}

/// Why an argument extractor could not produce a model set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("method must not be routed per model")]
    Forbidden,
    #[error("missing argument `{name}`")]
    MissingArgument { name: &'static str },
    #[error("argument `{name}` must be a list")]
    NotAList { name: &'static str },
    #[error("entry {index} of `{name}` must be a tuple")]
    NotATuple { name: &'static str, index: usize },
    #[error("entry {index} of `{name}` has {found} elements, expected {expected}")]
    WrongArity {
        name: &'static str,
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("argument `{name}` holds {value}, which is not a model")]
    InvalidModel { name: &'static str, value: String },
}

/// A call the selector refuses to route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("method `{method}` must not be invoked through the backend router")]
    ForbiddenOperation { method: String },
    #[error("request for `{method}` was not directed to a single backend (resolved to {backends:?})")]
    SplitBackendRouting {
        method: String,
        backends: Vec<Backend>,
    },
    #[error("model `{model}` has no registered backends")]
    UnknownModel { model: Model },
    #[error("malformed arguments for `{method}`: {source}")]
    MalformedArguments {
        method: String,
        #[source]
        source: ExtractError,
    },
}

impl SelectError {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            SelectError::ForbiddenOperation { .. } => "forbidden",
            SelectError::SplitBackendRouting { .. } => "split_backend",
            SelectError::UnknownModel { .. } => "unknown_model",
            SelectError::MalformedArguments { .. } => "malformed_arguments",
        }
    }
}

/// Errors surfaced by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("no service registered for backend `{backend}`")]
    UnknownBackend { backend: Backend },
    #[error("call to `{method}` timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
