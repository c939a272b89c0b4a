//! Error types for pipeline operations

use ferret_domain::StoreError;
use ferret_extractor::ExtractorError;
use thiserror::Error;

/// Errors that can occur while running the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The worker pool is disposing or disposed and accepts no more work
    #[error("Worker pool is disposed")]
    Disposed,

    /// The worker pool could not be started
    #[error("Startup error: {0}")]
    Startup(String),

    /// The worker holding a submission went away before completing it
    #[error("Worker lost before completing the submission")]
    WorkerLost,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Engine construction error
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),
}
