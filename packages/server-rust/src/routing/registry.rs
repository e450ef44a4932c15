use std::collections::{BTreeSet, HashMap, HashSet};

use tsdb_core::{Backend, Model, OperationKind};

use super::operation::SelectError;
use crate::traits::AnalyticsCapability;

// ---------------------------------------------------------------------------
// Capability oracles
// ---------------------------------------------------------------------------

/// Answers from the columns the analytical engine stores per model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelColumns;

impl AnalyticsCapability for ModelColumns {
    fn handles(&self, model: Model) -> bool {
        model.analytics_columns().is_some()
    }
}

/// Explicit list of analytics-backed models, e.g. from configuration.
impl AnalyticsCapability for HashSet<Model> {
    fn handles(&self, model: Model) -> bool {
        self.contains(&model)
    }
}

impl AnalyticsCapability for BTreeSet<Model> {
    fn handles(&self, model: Model) -> bool {
        self.contains(&model)
    }
}

// ---------------------------------------------------------------------------
// BackendPair
// ---------------------------------------------------------------------------

/// Where one model's reads and writes go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendPair {
    pub read: Backend,
    pub write: Backend,
}

impl BackendPair {
    #[must_use]
    pub const fn for_kind(self, kind: OperationKind) -> Backend {
        match kind {
            OperationKind::Read => self.read,
            OperationKind::Write => self.write,
        }
    }
}

// ---------------------------------------------------------------------------
// ModelRegistry
// ---------------------------------------------------------------------------

/// Read/write backend for every model. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    backends: HashMap<Model, BackendPair>,
}

impl ModelRegistry {
    /// Builds an entry for every model in [`Model::ALL`].
    ///
    /// Analytics-backed models read from [`Backend::Analytics`] and write to
    /// [`Backend::Sink`]; everything else uses [`Backend::Counter`] for both.
    #[must_use]
    pub fn build(capability: &dyn AnalyticsCapability) -> Self {
        let backends = Model::ALL
            .iter()
            .map(|&model| {
                let pair = if capability.handles(model) {
                    BackendPair {
                        read: Backend::Analytics,
                        write: Backend::Sink,
                    }
                } else {
                    BackendPair {
                        read: Backend::Counter,
                        write: Backend::Counter,
                    }
                };
                (model, pair)
            })
            .collect();
        Self { backends }
    }

    /// Builds a registry from explicit entries. Models left out are unknown.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Model, BackendPair)>) -> Self {
        Self {
            backends: pairs.into_iter().collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `SelectError::UnknownModel` if the model has no entry.
    pub fn backends_for(&self, model: Model) -> Result<BackendPair, SelectError> {
        self.backends
            .get(&model)
            .copied()
            .ok_or(SelectError::UnknownModel { model })
    }

    /// Entries in model declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Model, BackendPair)> + '_ {
        Model::ALL
            .iter()
            .filter_map(|&model| self.backends.get(&model).map(|pair| (model, *pair)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_model_has_an_entry() {
        let registry = ModelRegistry::build(&ModelColumns);
        assert_eq!(registry.len(), Model::ALL.len());
        for &model in Model::ALL {
            assert!(registry.backends_for(model).is_ok(), "{model} missing");
        }
    }

    #[test]
    fn analytics_models_read_analytics_and_write_to_sink() {
        let registry = ModelRegistry::build(&ModelColumns);
        let pair = registry.backends_for(Model::Group).unwrap();
        assert_eq!(pair.read, Backend::Analytics);
        assert_eq!(pair.write, Backend::Sink);
        assert_eq!(pair.for_kind(OperationKind::Read), Backend::Analytics);
        assert_eq!(pair.for_kind(OperationKind::Write), Backend::Sink);
    }

    #[test]
    fn other_models_use_counter_store_for_both() {
        let registry = ModelRegistry::build(&ModelColumns);
        for model in [
            Model::Internal,
            Model::OrganizationTotalReceived,
            Model::KeyTotalRejected,
        ] {
            let pair = registry.backends_for(model).unwrap();
            assert_eq!(
                pair,
                BackendPair {
                    read: Backend::Counter,
                    write: Backend::Counter,
                }
            );
        }
    }

    #[test]
    fn explicit_oracle_overrides_columns() {
        let only_internal: HashSet<Model> = HashSet::from([Model::Internal]);
        let registry = ModelRegistry::build(&only_internal);
        assert_eq!(
            registry.backends_for(Model::Internal).unwrap().read,
            Backend::Analytics
        );
        assert_eq!(
            registry.backends_for(Model::Project).unwrap().read,
            Backend::Counter
        );
    }

    #[test]
    fn unknown_model_is_reported() {
        let registry = ModelRegistry::from_pairs([(
            Model::Project,
            BackendPair {
                read: Backend::Counter,
                write: Backend::Counter,
            },
        )]);
        assert_eq!(
            registry.backends_for(Model::Release),
            Err(SelectError::UnknownModel {
                model: Model::Release
            })
        );
    }

    #[test]
    fn iter_follows_declaration_order() {
        let registry = ModelRegistry::build(&ModelColumns);
        let models: Vec<Model> = registry.iter().map(|(model, _)| model).collect();
        assert_eq!(models, Model::ALL);
    }
}
