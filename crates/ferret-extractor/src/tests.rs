//! Engine tests against the in-memory store

use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures every log line emitted on the current thread while alive
pub(crate) struct LogCapture {
    buffer: SharedBuffer,
    _guard: tracing::subscriber::DefaultGuard,
}

impl LogCapture {
    pub(crate) fn install() -> Self {
        let buffer = SharedBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            buffer,
            _guard: guard,
        }
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.0.lock().unwrap()).into_owned()
    }

    pub(crate) fn errors(&self) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains(" ERROR "))
            .count()
    }
}

mod indicator_engine {
    use super::LogCapture;
    use crate::{ExtractorConfig, FeatureExtractor, IndicatorEngine, RegexMatcher};
    use ferret_domain::traits::IndicatorMatcher;
    use ferret_domain::{
        ArticleContent, ArticleReference, IndicatorKind, IndicatorTypeTable, MatchError,
        RawIndicator,
    };
    use ferret_store::{MemoryStore, StoreCall, StoreOp};
    use std::sync::Arc;
    use uuid::Uuid;

    const URL: i32 = 1;
    const IP4: i32 = 3;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            indicator_types: IndicatorTypeTable::from_pairs([("url", URL), ("ip4", IP4)]),
            ..ExtractorConfig::default()
        }
    }

    fn engine(store: &MemoryStore, config: &ExtractorConfig) -> IndicatorEngine<MemoryStore> {
        let matcher = Arc::new(RegexMatcher::new().unwrap());
        IndicatorEngine::new(Arc::new(store.clone()), matcher, config).unwrap()
    }

    fn article(source_id: i64, text: &str) -> ArticleContent {
        ArticleContent::for_reference(&ArticleReference::new(Uuid::new_v4(), source_id), text)
    }

    #[tokio::test]
    async fn test_one_insert_and_link_per_candidate() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());

        let report = engine
            .extract_features(&article(1, "C2 at 45.77.1.2 serving http://evil.test/x"))
            .await;

        assert_eq!(report.found, 2);
        assert_eq!(report.persisted, 2);
        assert_eq!(store.count(StoreOp::InsertIndicator), 2);
        assert_eq!(store.count(StoreOp::LinkIndicator), 2);
        assert_eq!(
            store.indicators(),
            vec![
                (URL, "http://evil.test/x".to_string()),
                (IP4, "45.77.1.2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_persist_once() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());

        let report = engine
            .extract_features(&article(1, "1.2.3.4, again 1.2.3.4 and <b>1.2.3.4</b>"))
            .await;

        assert_eq!(report.found, 1);
        assert_eq!(store.count(StoreOp::InsertIndicator), 1);
        assert_eq!(store.count(StoreOp::LinkIndicator), 1);
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn test_filters_are_type_and_source_scoped() {
        let store = MemoryStore::new();
        store.add_global_filter(IP4, r"10\.0\.0\.\d+");
        store.add_global_filter(URL, r"8\.8\.8\.8");
        store.add_source_filter(7, URL, r"https://ads\.example\.com/.*");
        let engine = engine(&store, &config());

        let text = "10.0.0.5 8.8.8.8 https://ads.example.com/x http://ok.test/";
        let report = engine.extract_features(&article(7, text)).await;

        assert_eq!(report.found, 4);
        assert_eq!(report.filtered, 2);
        assert_eq!(report.persisted, 2);
        assert_eq!(
            store.indicators(),
            vec![
                (URL, "http://ok.test/".to_string()),
                (IP4, "8.8.8.8".to_string())
            ]
        );

        // Another source does not see source 7's filters
        let report = engine
            .extract_features(&article(8, "https://ads.example.com/x"))
            .await;
        assert_eq!(report.persisted, 1);
    }

    #[tokio::test]
    async fn test_filters_loaded_once_per_key() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());

        for source in [7, 7, 8, 7, 8] {
            engine.extract_features(&article(source, "1.1.1.1")).await;
        }

        assert_eq!(store.count(StoreOp::GlobalFilters), 1);
        assert_eq!(store.count(StoreOp::SourceFilters), 2);
    }

    #[tokio::test]
    async fn test_least_recent_source_evicted() {
        let store = MemoryStore::new();
        let config = ExtractorConfig {
            source_filter_cache_size: 2,
            ..config()
        };
        let engine = engine(&store, &config);

        for source in [1, 2, 1, 3] {
            engine.extract_features(&article(source, "1.1.1.1")).await;
        }
        assert!(engine.has_cached_source(1));
        assert!(!engine.has_cached_source(2));
        assert!(engine.has_cached_source(3));

        engine.extract_features(&article(2, "1.1.1.1")).await;
        assert_eq!(
            store
                .calls()
                .iter()
                .filter(|c| **c == StoreCall::SourceFilters(2))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_no_candidates_skips_source_filters() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());

        let report = engine.extract_features(&article(3, "nothing to see")).await;

        assert_eq!(report.found, 0);
        assert_eq!(store.count(StoreOp::SourceFilters), 0);
        assert!(!engine.has_cached_source(3));
    }

    #[tokio::test]
    async fn test_failed_insert_only_drops_that_candidate() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());
        store.fail_next(StoreOp::InsertIndicator, 4);

        let report = engine
            .extract_features(&article(1, "1.1.1.1 and 2.2.2.2"))
            .await;

        assert_eq!(report.persisted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn test_filter_load_failure_yields_nothing() {
        let logs = LogCapture::install();
        let store = MemoryStore::new();
        store.fail_next(StoreOp::GlobalFilters, 4);
        let engine = engine(&store, &config());

        let report = engine.extract_features(&article(1, "1.1.1.1")).await;

        assert_eq!(report.persisted, 0);
        assert_eq!(store.count(StoreOp::InsertIndicator), 0);
        assert_eq!(store.count(StoreOp::GlobalFilters), 4);
        assert!(logs.contents().contains("retries exhausted"));
        assert!(logs.contents().contains("Filters unavailable"));
    }

    #[tokio::test]
    async fn test_filter_load_recovers_within_retries() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::GlobalFilters, 2);
        let engine = engine(&store, &config());

        let report = engine.extract_features(&article(1, "1.1.1.1")).await;

        assert_eq!(report.persisted, 1);
        assert_eq!(store.count(StoreOp::GlobalFilters), 3);
    }

    struct BrokenMatcher;

    impl IndicatorMatcher for BrokenMatcher {
        fn find_indicators(
            &self,
            _text: &str,
            _kinds: &[IndicatorKind],
        ) -> Result<Vec<RawIndicator>, MatchError> {
            Err(MatchError::Input("unexpected input".to_string()))
        }
    }

    #[tokio::test]
    async fn test_matcher_failure_is_contained() {
        let logs = LogCapture::install();
        let store = MemoryStore::new();
        let engine =
            IndicatorEngine::new(Arc::new(store.clone()), Arc::new(BrokenMatcher), &config())
                .unwrap();

        let report = engine.extract_features(&article(1, "1.1.1.1")).await;

        assert_eq!(report.found, 0);
        assert_eq!(store.count(StoreOp::InsertIndicator), 0);
        assert!(logs.contents().contains("Error occurred while extracting"));
    }

    #[tokio::test]
    async fn test_markup_is_stripped_before_matching() {
        let store = MemoryStore::new();
        let engine = engine(&store, &config());

        let text = "&lt;a href=&quot;http://hidden.test/p&quot;&gt;link&lt;/a&gt; 9.9.9.9";
        let candidates = engine.candidates(text).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, "9.9.9.9");
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let store = MemoryStore::new();
        let config = ExtractorConfig {
            source_filter_cache_size: 0,
            ..config()
        };
        let matcher = Arc::new(RegexMatcher::new().unwrap());

        assert!(IndicatorEngine::new(Arc::new(store), matcher, &config).is_err());
    }
}

mod category_engine {
    use super::LogCapture;
    use crate::{CategoryEngine, ExtractorConfig, FeatureExtractor};
    use async_trait::async_trait;
    use ferret_domain::traits::RelationalStore;
    use ferret_domain::{
        ArticleContent, ArticleReference, CategoryRule, FilterPattern, StoreError,
    };
    use ferret_store::{MemoryStore, StoreOp};
    use std::sync::Arc;
    use uuid::Uuid;

    fn article(text: &str) -> ArticleContent {
        ArticleContent::for_reference(&ArticleReference::new(Uuid::new_v4(), 1), text)
    }

    fn engine(store: &MemoryStore) -> CategoryEngine<MemoryStore> {
        CategoryEngine::new(Arc::new(store.clone()), &ExtractorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_lowest_rank_match_assigned() {
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 2);
        store.add_category_rule(20, "ransomware", 1);
        store.add_category_rule(30, "weather", 0);
        let engine = engine(&store);

        let article = article("New RANSOMWARE strain drops malware");
        let report = engine.extract_features(&article).await;

        assert_eq!(report.persisted, 1);
        assert_eq!(store.article_categories(), vec![(20, article.article_id)]);
    }

    #[tokio::test]
    async fn test_no_match_writes_nothing() {
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 1);
        let engine = engine(&store);

        let report = engine.extract_features(&article("quarterly earnings")).await;

        assert_eq!(report.found, 0);
        assert_eq!(store.count(StoreOp::InsertCategory), 0);
    }

    #[tokio::test]
    async fn test_rules_loaded_once() {
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 1);
        let engine = engine(&store);

        for _ in 0..3 {
            engine.extract_features(&article("malware")).await;
        }

        assert_eq!(store.count(StoreOp::CategoryRules), 1);
        assert_eq!(store.count(StoreOp::InsertCategory), 3);
    }

    #[tokio::test]
    async fn test_exhausted_insert_logs_each_attempt() {
        let logs = LogCapture::install();
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 1);
        store.fail_next(StoreOp::InsertCategory, 4);
        let engine = engine(&store);

        let report = engine.extract_features(&article("malware")).await;

        assert_eq!(report.failed, 1);
        assert_eq!(store.count(StoreOp::InsertCategory), 4);
        assert_eq!(logs.errors(), 4);
    }

    #[tokio::test]
    async fn test_rule_load_failure_assigns_nothing() {
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 1);
        store.fail_next(StoreOp::CategoryRules, 4);
        let engine = engine(&store);

        let report = engine.extract_features(&article("malware")).await;

        assert_eq!(report, crate::ExtractionReport::empty("categories"));
        assert_eq!(store.count(StoreOp::InsertCategory), 0);
    }

    /// Hands out category rules in reverse rank order
    struct ReversedRules(MemoryStore);

    #[async_trait]
    impl RelationalStore for ReversedRules {
        async fn list_unextracted(&self) -> Result<Vec<ArticleReference>, StoreError> {
            self.0.list_unextracted().await
        }

        async fn mark_extracted(&self, article_id: Uuid) -> Result<(), StoreError> {
            self.0.mark_extracted(article_id).await
        }

        async fn insert_indicator_if_absent(
            &self,
            type_id: i32,
            value: &str,
        ) -> Result<i64, StoreError> {
            self.0.insert_indicator_if_absent(type_id, value).await
        }

        async fn link_article_indicator(
            &self,
            indicator_id: i64,
            article_id: Uuid,
        ) -> Result<(), StoreError> {
            self.0.link_article_indicator(indicator_id, article_id).await
        }

        async fn global_filters(&self) -> Result<Vec<FilterPattern>, StoreError> {
            self.0.global_filters().await
        }

        async fn source_filters(&self, source_id: i64) -> Result<Vec<FilterPattern>, StoreError> {
            self.0.source_filters(source_id).await
        }

        async fn category_rules(&self) -> Result<Vec<CategoryRule>, StoreError> {
            let mut rules = self.0.category_rules().await?;
            rules.reverse();
            Ok(rules)
        }

        async fn insert_article_category(
            &self,
            category_id: i64,
            article_id: Uuid,
        ) -> Result<(), StoreError> {
            self.0.insert_article_category(category_id, article_id).await
        }
    }

    #[tokio::test]
    async fn test_rules_ranked_at_load_whatever_store_order() {
        let store = MemoryStore::new();
        store.add_category_rule(10, "malware", 3);
        store.add_category_rule(20, "malware", 1);
        store.add_category_rule(30, "malware", 2);
        let engine = CategoryEngine::new(
            Arc::new(ReversedRules(store.clone())),
            &ExtractorConfig::default(),
        )
        .unwrap();

        let article = article("malware sample");
        engine.extract_features(&article).await;

        assert_eq!(engine.category_for("malware").await, Some(20));
        assert_eq!(store.article_categories(), vec![(20, article.article_id)]);
    }
}
