//! Indicator extraction and filtering engine

use crate::cache::RecencyCache;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::normalize::strip_html;
use crate::retry::resilient;
use crate::shared::SharedComputation;
use crate::types::{ExtractionReport, FeatureExtractor};
use async_trait::async_trait;
use ferret_domain::traits::{IndicatorMatcher, RelationalStore};
use ferret_domain::{
    ArticleContent, FilterSet, IndicatorCandidate, IndicatorKind, IndicatorTypeTable,
};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};
use uuid::Uuid;

const NAME: &str = "indicators";

enum Outcome {
    Persisted,
    Failed,
}

/// Finds, filters and persists indicators of compromise
///
/// Filter sets are loaded lazily and at most once per key: the global set
/// when the engine is created, a source's set the first time an article
/// from that source yields a candidate. Source sets live in a
/// [`RecencyCache`] guarded by a mutex, since articles from different
/// sources are extracted concurrently.
pub struct IndicatorEngine<S> {
    store: Arc<S>,
    matcher: Arc<dyn IndicatorMatcher>,
    types: IndicatorTypeTable,
    kinds: Vec<IndicatorKind>,
    max_retries: u32,
    global_filters: SharedComputation<FilterSet>,
    source_filters: Mutex<RecencyCache<i64, SharedComputation<FilterSet>>>,
}

impl<S> IndicatorEngine<S>
where
    S: RelationalStore + 'static,
{
    /// Create the engine and start loading the global filters
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        store: Arc<S>,
        matcher: Arc<dyn IndicatorMatcher>,
        config: &ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let global_filters = {
            let store = Arc::clone(&store);
            let max_retries = config.max_retries;
            SharedComputation::connect(async move {
                resilient("Load global filters", max_retries, || store.global_filters())
                    .await
                    .map(FilterSet::new)
            })
        };

        Ok(Self {
            store,
            matcher,
            types: config.indicator_types.clone(),
            kinds: config.indicator_types.kinds(),
            max_retries: config.max_retries,
            global_filters,
            source_filters: Mutex::new(RecencyCache::new(config.source_filter_cache_size)),
        })
    }

    /// Find the distinct candidates in an article's text, in order of appearance
    pub fn candidates(&self, content: &str) -> Result<Vec<IndicatorCandidate>, ExtractorError> {
        let text = strip_html(content);
        let raws = self.matcher.find_indicators(&text, &self.kinds)?;

        let mut seen = HashSet::new();
        Ok(raws
            .into_iter()
            .map(|raw| self.types.candidate(raw))
            .filter(|candidate| seen.insert(candidate.clone()))
            .collect())
    }

    /// The cached filter computation for a source, created on first use
    fn source_filters_for(&self, source_id: i64) -> SharedComputation<FilterSet> {
        let mut cache = self
            .source_filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(filters) = cache.get(&source_id) {
            return filters.clone();
        }

        let store = Arc::clone(&self.store);
        let max_retries = self.max_retries;
        let filters = SharedComputation::connect(async move {
            resilient("Load source filters", max_retries, || {
                store.source_filters(source_id)
            })
            .await
            .map(FilterSet::new)
        });
        if let Some((evicted, _)) = cache.put(source_id, filters.clone()) {
            debug!("Evicted filters of source {} from cache", evicted);
        }
        filters
    }

    /// Insert a candidate if absent and link it to the article
    async fn persist(&self, candidate: &IndicatorCandidate, article_id: Uuid) -> Outcome {
        let Some(indicator_id) = resilient("Insert indicator", self.max_retries, || {
            self.store
                .insert_indicator_if_absent(candidate.type_id, &candidate.value)
        })
        .await
        else {
            return Outcome::Failed;
        };

        match resilient("Link article indicator", self.max_retries, || {
            self.store.link_article_indicator(indicator_id, article_id)
        })
        .await
        {
            Some(()) => Outcome::Persisted,
            None => Outcome::Failed,
        }
    }

    /// Whether filters for a source are currently cached
    pub fn has_cached_source(&self, source_id: i64) -> bool {
        self.source_filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&source_id)
    }
}

#[async_trait]
impl<S> FeatureExtractor for IndicatorEngine<S>
where
    S: RelationalStore + 'static,
{
    fn name(&self) -> &'static str {
        NAME
    }

    async fn extract_features(&self, article: &ArticleContent) -> ExtractionReport {
        let mut report = ExtractionReport::empty(NAME);

        let candidates = match self.candidates(&article.content) {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Error occurred while extracting from {}: {}", article.article_id, e);
                return report;
            }
        };
        report.found = candidates.len();
        if candidates.is_empty() {
            return report;
        }

        let source = self.source_filters_for(article.source_id);
        let (global, source) = tokio::join!(self.global_filters.get(), source.get());
        let (Some(global), Some(source)) = (global, source) else {
            error!(
                "Filters unavailable for source {}, dropping {} candidates of {}",
                article.source_id,
                candidates.len(),
                article.article_id
            );
            return report;
        };

        let survivors: Vec<&IndicatorCandidate> = candidates
            .iter()
            .filter(|c| !global.is_filtered(c) && !source.is_filtered(c))
            .collect();
        report.filtered = candidates.len() - survivors.len();

        let outcomes = join_all(
            survivors
                .into_iter()
                .map(|candidate| self.persist(candidate, article.article_id)),
        )
        .await;
        for outcome in outcomes {
            match outcome {
                Outcome::Persisted => report.persisted += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        debug!("Article {}: {}", article.article_id, report);
        report
    }
}
