use tsdb_core::Model;

/// Oracle consulted while building the model registry: does the analytical
/// engine hold data for this model?
///
/// Models it answers `true` for are read from the analytical engine and have
/// their writes dropped at this layer, because they are ingested through a
/// separate path. All other models live entirely in the counter store.
pub trait AnalyticsCapability: Send + Sync {
    fn handles(&self, model: Model) -> bool;
}
