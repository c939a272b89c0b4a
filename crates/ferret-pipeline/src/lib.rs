//! Ferret Pipeline
//!
//! Runs feature extraction over every article that has not been extracted
//! yet.
//!
//! # Overview
//!
//! - [`ExtractionDispatcher`]: a fixed pool of worker threads, each with its
//!   own tokio runtime, storage pool and extraction engines. `submit` blocks
//!   until a worker has processed the article.
//! - [`Orchestrator`]: lists the backlog, fetches each article's content,
//!   submits it and marks it extracted, all under one run timeout.
//! - [`EngineFactory`]: builds a worker's engines on that worker's runtime;
//!   [`PgEngineFactory`] is the production implementation.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (caller's runtime)                 ExtractionDispatcher
//!   list_unextracted                          ┌──────────────────────────┐
//!   → get_content ──► spawn_blocking(submit) ─┼─► queue ─► worker 0..N   │
//!   ← mark_extracted ◄── completion signal ◄──┼── indicators ∥ categories│
//!                                             └──────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use ferret_extractor::ExtractorConfig;
//! use ferret_pipeline::{ExtractionDispatcher, Orchestrator, PgEngineFactory, PipelineConfig};
//! use ferret_store::{PgContentStore, PgStore, StoreConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store_config = StoreConfig::new("postgres://localhost/ferret");
//! let config = PipelineConfig::default();
//!
//! let factory = Arc::new(PgEngineFactory::new(
//!     store_config.clone(),
//!     ExtractorConfig::default(),
//! )?);
//! let pool_config = config.clone();
//! let dispatcher = Arc::new(
//!     tokio::task::spawn_blocking(move || ExtractionDispatcher::start(&pool_config, factory))
//!         .await??,
//! );
//!
//! let relational = Arc::new(PgStore::connect(&store_config).await?);
//! let content = Arc::new(PgContentStore::connect(&store_config).await?);
//! let orchestrator = Orchestrator::new(relational, content, dispatcher.clone(), config)?;
//! let metrics = orchestrator.run().await;
//!
//! println!("{}", metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod dispatcher;
mod error;
mod factory;
mod metrics;
mod orchestrator;
mod worker;

pub use config::PipelineConfig;
pub use dispatcher::{DispatcherState, ExtractionDispatcher, Submitter};
pub use error::PipelineError;
pub use factory::{EngineFactory, PgEngineFactory, WorkerEngines};
pub use metrics::RunMetrics;
pub use orchestrator::Orchestrator;
