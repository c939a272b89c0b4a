//! Category assignment engine

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::retry::resilient;
use crate::shared::SharedComputation;
use crate::types::{ExtractionReport, FeatureExtractor};
use async_trait::async_trait;
use ferret_domain::traits::RelationalStore;
use ferret_domain::{ArticleContent, CategoryRule};
use std::sync::Arc;
use tracing::{debug, error};

const NAME: &str = "categories";

/// Assigns each article the category of its lowest-ranked matching rule
///
/// The rule list is loaded once, when the engine is created, and shared by
/// every article the engine sees.
pub struct CategoryEngine<S> {
    store: Arc<S>,
    max_retries: u32,
    rules: SharedComputation<Vec<CategoryRule>>,
}

impl<S> CategoryEngine<S>
where
    S: RelationalStore + 'static,
{
    /// Create the engine and start loading the rules
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<S>, config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let rules = {
            let store = Arc::clone(&store);
            let max_retries = config.max_retries;
            SharedComputation::connect(async move {
                let mut rules =
                    resilient("Load category rules", max_retries, || store.category_rules())
                        .await?;
                rules.sort_by_key(|rule| rule.rank);
                Some(rules)
            })
        };

        Ok(Self {
            store,
            max_retries: config.max_retries,
            rules,
        })
    }

    /// The rule that decides the article's category, if any
    pub async fn category_for(&self, content: &str) -> Option<i64> {
        let rules = self.rules.get().await?;
        CategoryRule::first_match(&rules, content).map(|rule| rule.category_id)
    }
}

#[async_trait]
impl<S> FeatureExtractor for CategoryEngine<S>
where
    S: RelationalStore + 'static,
{
    fn name(&self) -> &'static str {
        NAME
    }

    async fn extract_features(&self, article: &ArticleContent) -> ExtractionReport {
        let mut report = ExtractionReport::empty(NAME);

        if self.rules.get().await.is_none() {
            error!(
                "Category rules unavailable, no category for {}",
                article.article_id
            );
            return report;
        }

        let Some(category_id) = self.category_for(&article.content).await else {
            debug!("No category rule matches {}", article.article_id);
            return report;
        };
        report.found = 1;

        match resilient("Insert article category", self.max_retries, || {
            self.store
                .insert_article_category(category_id, article.article_id)
        })
        .await
        {
            Some(()) => report.persisted = 1,
            None => report.failed = 1,
        }
        report
    }
}
