use tsdb_core::{Backend, Model};

/// Configuration for backend selection and dispatch.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Backend for methods that have no specification.
    pub default_backend: Backend,
    /// Models served by the analytical engine. `None` derives the set from
    /// the columns the engine stores (`Model::analytics_columns`).
    pub analytics_models: Option<Vec<Model>>,
    /// Default timeout for dispatched calls in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_backend: Backend::Counter,
            analytics_models: None,
            call_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.default_backend, Backend::Counter);
        assert!(config.analytics_models.is_none());
        assert_eq!(config.call_timeout_ms, 30_000);
    }
}
