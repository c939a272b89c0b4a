//! Error types for the Extractor

use ferret_domain::{MatchError, StoreError};
use thiserror::Error;

/// Errors raised while building extraction engines
///
/// Extraction itself never fails an article; these errors only surface at
/// construction time.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pattern matcher error
    #[error("Matcher error: {0}")]
    Match(#[from] MatchError),

    /// Storage error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
