//! Backend selection: decides which single backend services a call.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};
use tsdb_core::surface::{READ_METHODS, WRITE_METHODS};
use tsdb_core::{Backend, CallArgs};

use super::config::RouterConfig;
use super::operation::{ExtractError, RoutingDecision, SelectError, SpecError, Verdict};
use super::registry::{ModelColumns, ModelRegistry};
use super::spec::MethodTable;

// ---------------------------------------------------------------------------
// BackendSelector
// ---------------------------------------------------------------------------

/// Routes storage calls to exactly one backend.
///
/// Holds the model registry and the method table, both immutable after
/// construction, so a single instance can be shared behind an `Arc` by any
/// number of concurrent callers. `select` is pure apart from logging and
/// metrics.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    registry: ModelRegistry,
    table: MethodTable,
    default_backend: Backend,
}

impl BackendSelector {
    /// Builds the registry from the configured capability oracle and checks
    /// the built-in method table against the storage surface.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` if the method table does not match the surface.
    pub fn new(config: &RouterConfig) -> Result<Self, SpecError> {
        let registry = match &config.analytics_models {
            Some(models) => {
                let models: HashSet<_> = models.iter().copied().collect();
                ModelRegistry::build(&models)
            }
            None => ModelRegistry::build(&ModelColumns),
        };
        Self::from_parts(registry, MethodTable::builtin(), config.default_backend)
    }

    /// Assembles a selector from prebuilt parts.
    ///
    /// # Errors
    ///
    /// Returns `SpecError` if `table` does not match the storage surface.
    pub fn from_parts(
        registry: ModelRegistry,
        table: MethodTable,
        default_backend: Backend,
    ) -> Result<Self, SpecError> {
        table.verify(READ_METHODS, WRITE_METHODS)?;
        Ok(Self {
            registry,
            table,
            default_backend,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    #[must_use]
    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    #[must_use]
    pub fn default_backend(&self) -> Backend {
        self.default_backend
    }

    /// Chooses the backend for `method` called with `args`.
    ///
    /// Methods without a specification go to the default backend with a
    /// [`Verdict::Fallback`]; nothing is checked for them.
    ///
    /// # Errors
    ///
    /// - `SelectError::ForbiddenOperation` for methods that are never routed
    /// - `SelectError::MalformedArguments` if the models cannot be extracted
    /// - `SelectError::UnknownModel` if a model has no registry entry
    /// - `SelectError::SplitBackendRouting` unless the involved models resolve
    ///   to exactly one backend (an empty model set resolves to none)
    pub fn select(&self, method: &str, args: &CallArgs) -> Result<RoutingDecision, SelectError> {
        let result = self.resolve(method, args);
        record(method, &result);
        result
    }

    fn resolve(&self, method: &str, args: &CallArgs) -> Result<RoutingDecision, SelectError> {
        let Some(spec) = self.table.spec_of(method) else {
            return Ok(RoutingDecision {
                backend: self.default_backend,
                verdict: Verdict::Fallback,
            });
        };

        let models = spec.extractor.extract(args).map_err(|source| match source {
            ExtractError::Forbidden => SelectError::ForbiddenOperation {
                method: method.to_string(),
            },
            source => SelectError::MalformedArguments {
                method: method.to_string(),
                source,
            },
        })?;

        let backends = models
            .iter()
            .map(|&model| {
                self.registry
                    .backends_for(model)
                    .map(|pair| pair.for_kind(spec.kind))
            })
            .collect::<Result<BTreeSet<Backend>, SelectError>>()?;

        let mut resolved = backends.into_iter();
        match (resolved.next(), resolved.next()) {
            (Some(backend), None) => Ok(RoutingDecision {
                backend,
                verdict: Verdict::Verified {
                    kind: spec.kind,
                    models,
                },
            }),
            (first, second) => Err(SelectError::SplitBackendRouting {
                method: method.to_string(),
                backends: first.into_iter().chain(second).chain(resolved).collect(),
            }),
        }
    }
}

fn record(method: &str, result: &Result<RoutingDecision, SelectError>) {
    match result {
        Ok(decision) => {
            if decision.is_fallback() {
                warn!(
                    method,
                    backend = %decision.backend,
                    "no specification for method, routing to default backend"
                );
                metrics::counter!("tsdb_router_fallback_total", "method" => method.to_string())
                    .increment(1);
            } else {
                debug!(method, backend = %decision.backend, "routed");
            }
            metrics::counter!(
                "tsdb_router_decisions_total",
                "backend" => decision.backend.as_str(),
                "verdict" => decision.verdict.as_str()
            )
            .increment(1);
        }
        Err(err) => {
            debug!(method, reason = err.reason(), error = %err, "routing rejected");
            metrics::counter!("tsdb_router_rejections_total", "reason" => err.reason())
                .increment(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
