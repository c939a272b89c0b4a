//! Pipeline orchestrator - one pass over the unextracted backlog

use crate::config::PipelineConfig;
use crate::dispatcher::Submitter;
use crate::error::PipelineError;
use crate::metrics::RunMetrics;
use ferret_domain::traits::{ContentStore, RelationalStore};
use ferret_domain::ArticleReference;
use ferret_extractor::resilient;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Drives a run: list the backlog, fetch content, submit, mark extracted
///
/// Articles are processed as an unordered set with up to
/// [`PipelineConfig::orchestrator_concurrency`] in flight. A failure at any
/// stage drops only the article it happened to; the run itself never fails.
pub struct Orchestrator<R, C, D> {
    relational: Arc<R>,
    content: Arc<C>,
    dispatcher: Arc<D>,
    config: PipelineConfig,
    metrics: Arc<RunMetrics>,
}

impl<R, C, D> Orchestrator<R, C, D>
where
    R: RelationalStore + 'static,
    C: ContentStore + 'static,
    D: Submitter,
{
    /// Create an orchestrator over the given stores and worker pool
    ///
    /// Fails with [`PipelineError::Config`] when the configuration is invalid.
    pub fn new(
        relational: Arc<R>,
        content: Arc<C>,
        dispatcher: Arc<D>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        Ok(Self {
            relational,
            content,
            dispatcher,
            config,
            metrics: Arc::new(RunMetrics::new()),
        })
    }

    /// Metrics of the current run
    pub fn metrics(&self) -> Arc<RunMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process the whole backlog, bounded by the run timeout
    ///
    /// When the timeout fires, articles still in flight are abandoned: their
    /// worker keeps going, but they are not marked extracted and will be
    /// picked up again by the next run.
    pub async fn run(&self) -> Arc<RunMetrics> {
        let started = Instant::now();
        info!(
            "Starting extraction run (timeout {}s, {} articles in flight)",
            self.config.run_timeout_secs,
            self.config.orchestrator_concurrency()
        );

        if tokio::time::timeout(self.config.run_timeout(), self.process_backlog())
            .await
            .is_err()
        {
            self.metrics.mark_timed_out();
            warn!(
                "Extraction run timed out after {}s; abandoning outstanding articles",
                self.config.run_timeout_secs
            );
        }

        info!(
            "Extraction run finished in {:.1?}\n{}",
            started.elapsed(),
            self.metrics.summary()
        );
        self.metrics()
    }

    async fn process_backlog(&self) {
        let Some(backlog) = resilient("List unextracted articles", self.config.max_retries, || {
            self.relational.list_unextracted()
        })
        .await
        else {
            error!("Could not list unextracted articles; nothing to process");
            return;
        };

        info!("Found {} articles to process", backlog.len());
        self.metrics.record_discovered(backlog.len());

        let _: Vec<()> = stream::iter(backlog)
            .map(|reference| self.process_article(reference))
            .buffer_unordered(self.config.orchestrator_concurrency())
            .collect()
            .await;
    }

    async fn process_article(&self, reference: ArticleReference) {
        let label = format!("Fetch content for {}", reference.article_id);
        let article = match resilient(&label, self.config.max_retries, || {
            self.content.get_content(&reference)
        })
        .await
        {
            Some(Some(article)) => article,
            Some(None) => {
                warn!("No content stored for article {}; skipping", reference);
                self.metrics.record_missing_content();
                return;
            }
            None => {
                self.metrics.record_failed();
                return;
            }
        };
        self.metrics.record_fetched();

        let dispatcher = Arc::clone(&self.dispatcher);
        match tokio::task::spawn_blocking(move || dispatcher.submit(article)).await {
            Ok(Ok(())) => self.metrics.record_submitted(),
            Ok(Err(e)) => {
                error!("Extraction of article {} did not complete: {}", reference, e);
                self.metrics.record_failed();
                return;
            }
            Err(e) => {
                error!("Submission of article {} crashed: {}", reference, e);
                self.metrics.record_failed();
                return;
            }
        }

        let article_id = reference.article_id;
        let label = format!("Mark article {} extracted", article_id);
        if resilient(&label, self.config.max_retries, || {
            self.relational.mark_extracted(article_id)
        })
        .await
        .is_none()
        {
            self.metrics.record_failed();
            return;
        }

        let completed = self.metrics.record_completed();
        if completed % self.config.log_frequency == 0 {
            info!(
                "Extracted {} of {} articles",
                completed,
                self.metrics.discovered()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferret_domain::ArticleContent;
    use ferret_store::{MemoryStore, StoreOp};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Uuid>>,
        reject: Option<Uuid>,
    }

    impl Submitter for Recorder {
        fn submit(&self, article: ArticleContent) -> Result<(), PipelineError> {
            if self.reject == Some(article.article_id) {
                return Err(PipelineError::WorkerLost);
            }
            self.seen.lock().unwrap().push(article.article_id);
            Ok(())
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            workers: 2,
            max_retries: 1,
            log_frequency: 1,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_backlog() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let orchestrator =
            Orchestrator::new(store.clone(), store.clone(), recorder.clone(), config()).unwrap();

        let metrics = orchestrator.run().await;

        assert_eq!(metrics.discovered(), 0);
        assert_eq!(store.count(StoreOp::MarkExtracted), 0);
        assert!(!metrics.timed_out());
    }

    #[tokio::test]
    async fn test_rejected_submission_is_not_marked() {
        let store = Arc::new(MemoryStore::new());
        let kept = ArticleReference::new(Uuid::new_v4(), 1);
        let lost = ArticleReference::new(Uuid::new_v4(), 1);
        store.add_article(kept, Some("text"));
        store.add_article(lost, Some("text"));

        let recorder = Arc::new(Recorder {
            reject: Some(lost.article_id),
            ..Recorder::default()
        });
        let orchestrator =
            Orchestrator::new(store.clone(), store.clone(), recorder.clone(), config()).unwrap();

        let metrics = orchestrator.run().await;

        assert_eq!(metrics.completed(), 1);
        assert_eq!(metrics.failed(), 1);
        assert!(store.extracted().contains(&kept.article_id));
        assert!(!store.extracted().contains(&lost.article_id));
    }

    #[tokio::test]
    async fn test_backlog_listing_failure_processes_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.add_article(ArticleReference::new(Uuid::new_v4(), 1), Some("text"));
        store.fail_next(StoreOp::ListUnextracted, 2);

        let recorder = Arc::new(Recorder::default());
        let orchestrator =
            Orchestrator::new(store.clone(), store.clone(), recorder.clone(), config()).unwrap();

        let metrics = orchestrator.run().await;

        assert_eq!(store.count(StoreOp::ListUnextracted), 2);
        assert_eq!(metrics.discovered(), 0);
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_is_retried() {
        let store = Arc::new(MemoryStore::new());
        let reference = ArticleReference::new(Uuid::new_v4(), 1);
        store.add_article(reference, Some("text"));
        store.fail_next(StoreOp::GetContent, 1);

        let recorder = Arc::new(Recorder::default());
        let orchestrator =
            Orchestrator::new(store.clone(), store.clone(), recorder.clone(), config()).unwrap();

        let metrics = orchestrator.run().await;

        assert_eq!(metrics.completed(), 1);
        assert_eq!(store.count(StoreOp::GetContent), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());

        for config in [
            PipelineConfig {
                log_frequency: 0,
                ..config()
            },
            PipelineConfig {
                workers: 0,
                ..config()
            },
            PipelineConfig {
                threads_per_core: 0,
                ..config()
            },
        ] {
            let result = Orchestrator::new(store.clone(), store.clone(), recorder.clone(), config);
            assert!(matches!(result, Err(PipelineError::Config(_))));
        }
    }
}
