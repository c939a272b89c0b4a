//! End-to-end runs through the orchestrator and a real worker pool

mod common;

use common::{pipeline_config, MemoryFactory, IP4};
use ferret_domain::{ArticleContent, ArticleReference};
use ferret_pipeline::{
    ExtractionDispatcher, Orchestrator, PipelineConfig, PipelineError, Submitter,
};
use ferret_store::{MemoryStore, StoreOp};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Counts submissions before forwarding them to the real pool
struct CountingSubmitter {
    inner: ExtractionDispatcher,
    submissions: AtomicUsize,
}

impl Submitter for CountingSubmitter {
    fn submit(&self, article: ArticleContent) -> Result<(), PipelineError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.inner.submit(article)
    }
}

async fn start_pool(store: &MemoryStore, config: &PipelineConfig) -> Arc<CountingSubmitter> {
    let factory = Arc::new(MemoryFactory::new(store));
    let config = config.clone();
    let inner = tokio::task::spawn_blocking(move || ExtractionDispatcher::start(&config, factory))
        .await
        .unwrap()
        .unwrap();
    Arc::new(CountingSubmitter {
        inner,
        submissions: AtomicUsize::new(0),
    })
}

async fn dispose(pool: Arc<CountingSubmitter>) {
    tokio::task::spawn_blocking(move || pool.inner.dispose())
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_article_without_content_is_skipped() {
    let store = MemoryStore::new();
    let first = ArticleReference::new(Uuid::new_v4(), 1);
    let second = ArticleReference::new(Uuid::new_v4(), 2);
    let third = ArticleReference::new(Uuid::new_v4(), 3);
    store.add_article(first, Some("callback to 45.77.1.2"));
    store.add_article(second, Some("<p>nothing here</p>"));
    store.add_article(third, None);

    let config = pipeline_config(2);
    let pool = start_pool(&store, &config).await;
    let orchestrator = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config,
    )
    .unwrap();

    let metrics = orchestrator.run().await;

    assert_eq!(pool.submissions.load(Ordering::SeqCst), 2);
    assert_eq!(store.count(StoreOp::MarkExtracted), 2);
    assert_eq!(store.writes_for(third.article_id), 0);
    assert!(store.extracted().contains(&first.article_id));
    assert!(store.extracted().contains(&second.article_id));
    assert_eq!(store.indicators(), vec![(IP4, "45.77.1.2".to_string())]);

    assert_eq!(metrics.discovered(), 3);
    assert_eq!(metrics.missing_content(), 1);
    assert_eq!(metrics.completed(), 2);
    assert_eq!(metrics.failed(), 0);

    dispose(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_run_finds_nothing_left() {
    let store = MemoryStore::new();
    for i in 0..5 {
        let reference = ArticleReference::new(Uuid::new_v4(), i);
        store.add_article(reference, Some(&format!("seen at 192.0.2.{}", i + 1)));
    }

    let config = pipeline_config(2);
    let pool = start_pool(&store, &config).await;
    let orchestrator = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config.clone(),
    )
    .unwrap();

    assert_eq!(orchestrator.run().await.completed(), 5);
    assert_eq!(store.link_count(), 5);

    let rerun = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config,
    )
    .unwrap();
    let metrics = rerun.run().await;
    assert_eq!(metrics.discovered(), 0);
    assert_eq!(pool.submissions.load(Ordering::SeqCst), 5);

    dispose(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exhausted_mark_leaves_article_for_next_run() {
    let store = MemoryStore::new();
    let reference = ArticleReference::new(Uuid::new_v4(), 1);
    store.add_article(reference, Some("45.77.1.2"));
    store.fail_next(StoreOp::MarkExtracted, 2);

    let config = pipeline_config(1);
    let pool = start_pool(&store, &config).await;
    let orchestrator = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config,
    )
    .unwrap();

    let metrics = orchestrator.run().await;

    assert_eq!(metrics.failed(), 1);
    assert_eq!(metrics.completed(), 0);
    assert_eq!(store.count(StoreOp::MarkExtracted), 2);
    assert!(store.extracted().is_empty());

    dispose(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_timeout_abandons_outstanding_work() {
    let store = MemoryStore::new();
    store.add_article(ArticleReference::new(Uuid::new_v4(), 1), Some("45.77.1.2"));
    store.set_content_latency(Duration::from_secs(30));

    let config = PipelineConfig {
        run_timeout_secs: 1,
        ..pipeline_config(1)
    };
    let pool = start_pool(&store, &config).await;
    let orchestrator = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config,
    )
    .unwrap();

    let metrics = tokio::time::timeout(Duration::from_secs(10), orchestrator.run())
        .await
        .expect("the run timeout should fire first");

    assert!(metrics.timed_out());
    assert_eq!(metrics.discovered(), 1);
    assert_eq!(metrics.completed(), 0);
    assert_eq!(pool.submissions.load(Ordering::SeqCst), 0);
    assert!(store.extracted().is_empty());

    dispose(pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disposed_pool_drops_articles_without_marking() {
    let store = MemoryStore::new();
    store.add_article(ArticleReference::new(Uuid::new_v4(), 1), Some("45.77.1.2"));
    store.add_article(ArticleReference::new(Uuid::new_v4(), 1), Some("45.77.1.3"));

    let config = pipeline_config(1);
    let pool = start_pool(&store, &config).await;
    dispose(Arc::clone(&pool)).await;

    let orchestrator = Orchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::clone(&pool),
        config,
    )
    .unwrap();
    let metrics = orchestrator.run().await;

    assert_eq!(metrics.failed(), 2);
    assert_eq!(store.count(StoreOp::MarkExtracted), 0);
    assert_eq!(store.count(StoreOp::InsertIndicator), 0);
}
