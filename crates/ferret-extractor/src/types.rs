//! Extraction contract and per-article results

use async_trait::async_trait;
use ferret_domain::ArticleContent;
use std::fmt;

/// Summary of one engine run over one article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Name of the engine that produced the report
    pub extractor: &'static str,

    /// Distinct candidates found (indicators) or rules matched (categories)
    pub found: usize,

    /// Candidates dropped by a filter
    pub filtered: usize,

    /// Values written to storage
    pub persisted: usize,

    /// Values whose write ultimately failed
    pub failed: usize,
}

impl ExtractionReport {
    /// An empty report for an engine
    pub fn empty(extractor: &'static str) -> Self {
        Self {
            extractor,
            ..Self::default()
        }
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: found {}, filtered {}, persisted {}, failed {}",
            self.extractor, self.found, self.filtered, self.persisted, self.failed
        )
    }
}

/// An engine extracting one kind of feature from article content
///
/// Extraction never fails: errors are logged and reported as an empty or
/// partial [`ExtractionReport`].
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// Short engine name used in logs
    fn name(&self) -> &'static str;

    /// Extract and persist features from one article
    async fn extract_features(&self, article: &ArticleContent) -> ExtractionReport;
}
