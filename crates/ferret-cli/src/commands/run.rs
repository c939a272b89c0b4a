//! Run command implementation.

use crate::config::Config;
use crate::error::Result;
use ferret_pipeline::{ExtractionDispatcher, Orchestrator, PgEngineFactory, RunMetrics};
use ferret_store::{PgContentStore, PgStore};
use std::sync::Arc;
use tracing::info;

/// Extract features from every unextracted article.
///
/// Fails only when the stores or the worker pool cannot be started; per
/// article failures are logged and counted in the returned metrics.
pub async fn execute_run(config: &Config) -> Result<Arc<RunMetrics>> {
    config.validate()?;
    let store_config = config.store_config()?;

    let relational = Arc::new(PgStore::connect(&store_config).await?);
    let content = Arc::new(PgContentStore::connect(&store_config).await?);

    let factory = Arc::new(PgEngineFactory::new(
        store_config,
        config.extractor.clone(),
    )?);
    let pool_config = config.pipeline.clone();
    let dispatcher = Arc::new(
        tokio::task::spawn_blocking(move || ExtractionDispatcher::start(&pool_config, factory))
            .await??,
    );

    let orchestrator = Orchestrator::new(
        Arc::clone(&relational),
        Arc::clone(&content),
        Arc::clone(&dispatcher),
        config.pipeline.clone(),
    )?;
    let metrics = orchestrator.run().await;
    drop(orchestrator);

    tokio::task::spawn_blocking(move || dispatcher.dispose()).await?;
    relational.close().await;
    content.close().await;

    info!("Extraction complete");
    Ok(metrics)
}
