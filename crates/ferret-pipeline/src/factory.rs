//! Per-worker engine construction

use crate::error::PipelineError;
use async_trait::async_trait;
use ferret_extractor::{
    CategoryEngine, ExtractorConfig, FeatureExtractor, IndicatorEngine, RegexMatcher,
};
use ferret_store::{PgStore, StoreConfig};
use std::sync::Arc;
use tracing::debug;

/// The engines owned by one worker
///
/// Every submitted article runs through each extractor concurrently.
#[derive(Clone, Default)]
pub struct WorkerEngines {
    /// Extractors applied to every article
    pub extractors: Vec<Arc<dyn FeatureExtractor>>,
}

impl WorkerEngines {
    /// Wrap a list of extractors
    pub fn new(extractors: Vec<Arc<dyn FeatureExtractor>>) -> Self {
        Self { extractors }
    }

    /// Names of the extractors, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

/// Builds the engines a worker uses for its whole lifetime
///
/// `build` runs on the worker's own runtime, so anything it spawns (filter
/// and rule loads, connection pools) belongs to that worker.
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    /// Build the engines for one worker
    async fn build(&self, worker_id: usize) -> Result<WorkerEngines, PipelineError>;
}

/// Factory connecting each worker to Postgres with its own pool
pub struct PgEngineFactory {
    store: StoreConfig,
    extractor: ExtractorConfig,
}

impl PgEngineFactory {
    /// Create a factory from validated store and extractor configs
    pub fn new(store: StoreConfig, extractor: ExtractorConfig) -> Result<Self, PipelineError> {
        store.validate().map_err(PipelineError::Config)?;
        extractor.validate().map_err(PipelineError::Config)?;
        Ok(Self { store, extractor })
    }
}

#[async_trait]
impl EngineFactory for PgEngineFactory {
    async fn build(&self, worker_id: usize) -> Result<WorkerEngines, PipelineError> {
        let store = Arc::new(PgStore::connect(&self.store).await?);
        let matcher = Arc::new(RegexMatcher::new()?);

        let indicators = IndicatorEngine::new(Arc::clone(&store), matcher, &self.extractor)?;
        let categories = CategoryEngine::new(store, &self.extractor)?;

        debug!("Worker {} engines built", worker_id);
        Ok(WorkerEngines::new(vec![
            Arc::new(indicators),
            Arc::new(categories),
        ]))
    }
}
