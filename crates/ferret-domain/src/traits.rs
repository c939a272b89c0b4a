//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! its collaborators. Storage implementations live in `ferret-store`; the
//! regex-based matcher lives in `ferret-extractor`.

use crate::{
    ArticleContent, ArticleReference, CategoryRule, FilterPattern, IndicatorKind, MatchError,
    RawIndicator, StoreError,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Store holding scraped article text
///
/// Implemented by the infrastructure layer (ferret-store)
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the content for an article
    ///
    /// Returns `Ok(None)` when the article has no stored content yet.
    async fn get_content(
        &self,
        reference: &ArticleReference,
    ) -> Result<Option<ArticleContent>, StoreError>;
}

/// Relational store holding articles, indicators, filters and categories
///
/// Implemented by the infrastructure layer (ferret-store)
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// List every article not yet feature-extracted
    async fn list_unextracted(&self) -> Result<Vec<ArticleReference>, StoreError>;

    /// Mark an article as feature-extracted
    async fn mark_extracted(&self, article_id: Uuid) -> Result<(), StoreError>;

    /// Insert an indicator unless it exists, returning its canonical id
    async fn insert_indicator_if_absent(&self, type_id: i32, value: &str)
        -> Result<i64, StoreError>;

    /// Link an article to an indicator
    async fn link_article_indicator(&self, indicator_id: i64, article_id: Uuid)
        -> Result<(), StoreError>;

    /// Filters applied to every article
    async fn global_filters(&self) -> Result<Vec<FilterPattern>, StoreError>;

    /// Filters applied only to articles from one source
    async fn source_filters(&self, source_id: i64) -> Result<Vec<FilterPattern>, StoreError>;

    /// Category rules in ascending rank order
    async fn category_rules(&self) -> Result<Vec<CategoryRule>, StoreError>;

    /// Assign a category to an article
    async fn insert_article_category(&self, category_id: i64, article_id: Uuid)
        -> Result<(), StoreError>;
}

/// Finds indicator substrings in plain text
///
/// Implemented by the application layer (ferret-extractor). Matching is
/// CPU-bound and synchronous.
pub trait IndicatorMatcher: Send + Sync {
    /// Find every indicator of the given kinds, in match order
    fn find_indicators(
        &self,
        text: &str,
        kinds: &[IndicatorKind],
    ) -> Result<Vec<RawIndicator>, MatchError>;
}
