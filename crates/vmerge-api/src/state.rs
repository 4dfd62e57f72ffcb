//! Application state.

use std::sync::Arc;

use vmerge_pipeline::{InMemoryJobRegistry, Orchestrator, PipelineConfig, PipelineResult};
use vmerge_storage::{ObjectStorePublisher, StoragePublisher};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Orchestrator,
    pub storage: Arc<dyn StoragePublisher>,
}

impl AppState {
    /// Wire the production pipeline from environment variables.
    ///
    /// Missing storage settings do not fail startup; jobs fail at publish
    /// time and `/ready` reports the store as degraded.
    pub fn from_env(config: ApiConfig) -> PipelineResult<Self> {
        let storage: Arc<dyn StoragePublisher> = Arc::new(ObjectStorePublisher::from_env());
        let orchestrator = Orchestrator::with_defaults(
            Arc::new(InMemoryJobRegistry::new()),
            Arc::clone(&storage),
            PipelineConfig::from_env(),
        )?;
        Ok(Self::from_parts(config, orchestrator, storage))
    }

    pub fn from_parts(
        config: ApiConfig,
        orchestrator: Orchestrator,
        storage: Arc<dyn StoragePublisher>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            storage,
        }
    }
}
