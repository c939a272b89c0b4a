//! Shared fixtures for the pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ferret_domain::{ArticleContent, IndicatorTypeTable};
use ferret_extractor::{
    CategoryEngine, ExtractionReport, ExtractorConfig, FeatureExtractor, IndicatorEngine,
    RegexMatcher,
};
use ferret_pipeline::{EngineFactory, PipelineConfig, PipelineError, WorkerEngines};
use ferret_store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

pub const IP4: i32 = 3;

pub fn pipeline_config(workers: usize) -> PipelineConfig {
    PipelineConfig {
        workers,
        threads_per_core: 2,
        max_retries: 1,
        dispose_timeout_secs: 2,
        ..PipelineConfig::default()
    }
}

pub fn extractor_config() -> ExtractorConfig {
    ExtractorConfig {
        indicator_types: IndicatorTypeTable::from_pairs([("ip4", IP4)]),
        ..ExtractorConfig::default()
    }
}

/// Builds the real engines over a shared in-memory store
pub struct MemoryFactory {
    pub store: MemoryStore,
    pub fail_worker: Option<usize>,
}

impl MemoryFactory {
    pub fn new(store: &MemoryStore) -> Self {
        Self {
            store: store.clone(),
            fail_worker: None,
        }
    }
}

#[async_trait]
impl EngineFactory for MemoryFactory {
    async fn build(&self, worker_id: usize) -> Result<WorkerEngines, PipelineError> {
        if self.fail_worker == Some(worker_id) {
            return Err(PipelineError::Startup("database unreachable".to_string()));
        }

        let store = Arc::new(self.store.clone());
        let matcher = Arc::new(RegexMatcher::new()?);
        let config = extractor_config();
        Ok(WorkerEngines::new(vec![
            Arc::new(IndicatorEngine::new(Arc::clone(&store), matcher, &config)?),
            Arc::new(CategoryEngine::new(store, &config)?),
        ]))
    }
}

/// An engine that panics on articles containing "poison" and otherwise
/// sleeps for a while
pub struct MisbehavingEngine {
    pub delay: Duration,
}

#[async_trait]
impl FeatureExtractor for MisbehavingEngine {
    fn name(&self) -> &'static str {
        "misbehaving"
    }

    async fn extract_features(&self, article: &ArticleContent) -> ExtractionReport {
        if article.content.contains("poison") {
            panic!("engine crashed");
        }
        tokio::time::sleep(self.delay).await;
        ExtractionReport::empty(self.name())
    }
}

/// Factory handing every worker a [`MisbehavingEngine`]
pub struct MisbehavingFactory {
    pub delay: Duration,
}

#[async_trait]
impl EngineFactory for MisbehavingFactory {
    async fn build(&self, _worker_id: usize) -> Result<WorkerEngines, PipelineError> {
        Ok(WorkerEngines::new(vec![Arc::new(MisbehavingEngine {
            delay: self.delay,
        })]))
    }
}
