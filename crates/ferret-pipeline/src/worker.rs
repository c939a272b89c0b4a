//! Worker execution context
//!
//! Each worker is an OS thread driving its own multi-threaded tokio runtime.
//! The runtime owns the worker's engines and connection pool, so nothing
//! built by one worker is ever touched by another.

use crate::factory::{EngineFactory, WorkerEngines};
use ferret_domain::ArticleContent;
use futures::future::join_all;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// How long a stopping worker waits for its own background tasks
const RUNTIME_SHUTDOWN: Duration = Duration::from_secs(1);

/// A message on the shared work queue
pub(crate) enum Job {
    /// Extract one article and signal its submitter
    Extract(WorkerTask),
    /// Sentinel that lets a waiting worker observe the disposed flag
    Wake,
}

/// One submission: the article and its single-use completion signal
pub(crate) struct WorkerTask {
    pub article: ArticleContent,
    pub done: SyncSender<()>,
}

/// Everything a worker thread needs, moved into the thread on spawn
pub(crate) struct WorkerContext<F> {
    pub id: usize,
    pub threads: usize,
    pub factory: Arc<F>,
    pub jobs: Arc<Mutex<Receiver<Job>>>,
    pub disposed: Arc<AtomicBool>,
    pub ready: Sender<(usize, Result<(), String>)>,
    pub exited: Sender<()>,
}

/// Spawn a named worker thread
pub(crate) fn spawn<F: EngineFactory>(context: WorkerContext<F>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("ferret-worker-{}", context.id))
        .spawn(move || run(context))
}

fn run<F: EngineFactory>(context: WorkerContext<F>) {
    let id = context.id;

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(context.threads)
        .thread_name(format!("ferret-worker-{}-rt", id))
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Worker {} could not build its runtime: {}", id, e);
            let _ = context.ready.send((id, Err(e.to_string())));
            let _ = context.exited.send(());
            return;
        }
    };

    let engines = match runtime.block_on(context.factory.build(id)) {
        Ok(engines) => engines,
        Err(e) => {
            error!("Worker {} failed to start: {}", id, e);
            let _ = context.ready.send((id, Err(e.to_string())));
            runtime.shutdown_timeout(RUNTIME_SHUTDOWN);
            let _ = context.exited.send(());
            return;
        }
    };

    debug!("Worker {} ready with engines [{}]", id, engines.names().join(", "));
    let _ = context.ready.send((id, Ok(())));

    loop {
        let job = {
            let jobs = context.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            jobs.recv()
        };

        match job {
            // Every sender is gone: the pool was disposed
            Err(_) => break,
            Ok(Job::Wake) => {
                if context.disposed.load(Ordering::SeqCst) {
                    break;
                }
            }
            Ok(Job::Extract(task)) => {
                if context.disposed.load(Ordering::SeqCst) {
                    // Dropping the task releases its submitter with a disposed error
                    drop(task);
                    break;
                }
                runtime.block_on(process(id, &engines, task.article));
                let _ = task.done.send(());
            }
        }
    }

    {
        let _guard = runtime.enter();
        drop(engines);
    }
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN);

    info!("Worker {} stopped", id);
    let _ = context.exited.send(());
}

/// Run every engine over the article concurrently
///
/// Each engine runs as its own task, so a panic in one is contained to
/// that engine and that article.
async fn process(worker_id: usize, engines: &WorkerEngines, article: ArticleContent) {
    let article = Arc::new(article);

    let runs = engines.extractors.iter().map(|extractor| {
        let extractor = Arc::clone(extractor);
        let article = Arc::clone(&article);
        tokio::spawn(async move { extractor.extract_features(&article).await })
    });

    for result in join_all(runs).await {
        match result {
            Ok(report) => debug!(
                "Worker {} extracted {}: {}",
                worker_id, article.article_id, report
            ),
            Err(e) => error!(
                "Worker {} extractor crashed on {}: {}",
                worker_id, article.article_id, e
            ),
        }
    }
}
