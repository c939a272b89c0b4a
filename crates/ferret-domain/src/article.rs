//! Article module - the unit of work flowing through the pipeline

use std::fmt;
use uuid::Uuid;

/// Reference to an article that has not been feature-extracted yet
///
/// Produced by the backlog query and consumed exactly once by the
/// content-fetch stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArticleReference {
    /// Article identifier
    pub article_id: Uuid,

    /// Identifier of the source the article was collected from
    pub source_id: i64,
}

impl ArticleReference {
    /// Create a new reference
    pub fn new(article_id: Uuid, source_id: i64) -> Self {
        Self {
            article_id,
            source_id,
        }
    }
}

impl fmt::Display for ArticleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (source {})", self.article_id, self.source_id)
    }
}

/// Scraped article text ready for extraction
///
/// `content` is never absent: an article that has not been scraped yet
/// carries an empty string so that it can still be marked as extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleContent {
    /// Article identifier
    pub article_id: Uuid,

    /// Raw (possibly HTML-escaped) article text
    pub content: String,

    /// Identifier of the source the article was collected from
    pub source_id: i64,
}

impl ArticleContent {
    /// Create article content for a reference
    ///
    /// # Examples
    ///
    /// ```
    /// use ferret_domain::{ArticleContent, ArticleReference};
    /// use uuid::Uuid;
    ///
    /// let reference = ArticleReference::new(Uuid::nil(), 7);
    /// let article = ArticleContent::for_reference(&reference, "<p>hello</p>");
    /// assert_eq!(article.source_id, 7);
    /// assert!(!article.is_empty());
    /// ```
    pub fn for_reference(reference: &ArticleReference, content: impl Into<String>) -> Self {
        Self {
            article_id: reference.article_id,
            content: content.into(),
            source_id: reference.source_id,
        }
    }

    /// Article content standing in for "not yet scraped"
    pub fn empty(reference: &ArticleReference) -> Self {
        Self::for_reference(reference, String::new())
    }

    /// The reference this content belongs to
    pub fn reference(&self) -> ArticleReference {
        ArticleReference::new(self.article_id, self.source_id)
    }

    /// Whether the article has no text at all
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_keeps_identity() {
        let reference = ArticleReference::new(Uuid::new_v4(), 3);
        let article = ArticleContent::empty(&reference);

        assert!(article.is_empty());
        assert_eq!(article.reference(), reference);
    }

    #[test]
    fn test_reference_display() {
        let reference = ArticleReference::new(Uuid::nil(), 12);
        assert_eq!(
            reference.to_string(),
            "00000000-0000-0000-0000-000000000000 (source 12)"
        );
    }
}
