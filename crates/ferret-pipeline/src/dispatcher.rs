//! Extraction dispatcher - a fixed pool of isolated workers behind a
//! blocking submit

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::factory::EngineFactory;
use crate::worker::{self, Job, WorkerContext, WorkerTask};
use ferret_domain::ArticleContent;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

/// Lifecycle of an [`ExtractionDispatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Workers are being spawned and built
    Starting,
    /// Every worker is ready; submissions are accepted
    Running,
    /// `dispose` is stopping the workers
    Disposing,
    /// Terminal; no submissions are accepted
    Disposed,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatcherState::Starting => "starting",
            DispatcherState::Running => "running",
            DispatcherState::Disposing => "disposing",
            DispatcherState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

struct WorkerHandle {
    id: usize,
    thread: JoinHandle<()>,
    exited: Receiver<()>,
}

/// Accepts articles for extraction and blocks until a worker finishes them
///
/// Implemented by [`ExtractionDispatcher`]; the orchestrator depends only
/// on this trait so that runs can be driven without real workers.
pub trait Submitter: Send + Sync + 'static {
    /// Hand one article to a worker and block until it has been processed
    fn submit(&self, article: ArticleContent) -> Result<(), PipelineError>;
}

/// A fixed pool of worker threads, each with its own runtime and engines
///
/// All workers read from one bounded queue. [`submit`](Self::submit) blocks
/// its calling thread until the worker that picked the article signals
/// completion, which bounds the number of articles in flight.
///
/// # Examples
///
/// ```no_run
/// use ferret_extractor::ExtractorConfig;
/// use ferret_pipeline::{ExtractionDispatcher, PgEngineFactory, PipelineConfig};
/// use ferret_store::StoreConfig;
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let factory = PgEngineFactory::new(
///     StoreConfig::new("postgres://localhost/ferret"),
///     ExtractorConfig::default(),
/// )?;
/// let dispatcher = ExtractionDispatcher::start(&PipelineConfig::default(), Arc::new(factory))?;
/// // ... submit articles ...
/// dispatcher.dispose();
/// # Ok(())
/// # }
/// ```
pub struct ExtractionDispatcher {
    queue: Mutex<Option<SyncSender<Job>>>,
    disposed: Arc<AtomicBool>,
    state: Mutex<DispatcherState>,
    workers: Mutex<Vec<WorkerHandle>>,
    worker_count: usize,
    dispose_timeout: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExtractionDispatcher {
    /// Spawn the workers and block until every one of them is ready
    ///
    /// Fails with [`PipelineError::Startup`] if any worker cannot build its
    /// engines; the workers already started are disposed first. Blocks the
    /// calling thread, so async callers should use `spawn_blocking`.
    pub fn start<F: EngineFactory>(
        config: &PipelineConfig,
        factory: Arc<F>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        let (queue, jobs) = mpsc::sync_channel(config.workers);
        let jobs = Arc::new(Mutex::new(jobs));
        let (ready, readiness) = mpsc::channel();

        let dispatcher = Self {
            queue: Mutex::new(Some(queue)),
            disposed: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(DispatcherState::Starting),
            workers: Mutex::new(Vec::with_capacity(config.workers)),
            worker_count: config.workers,
            dispose_timeout: config.dispose_timeout(),
        };

        for id in 0..config.workers {
            let (exited, exit_signal) = mpsc::channel();
            let context = WorkerContext {
                id,
                threads: config.threads_per_core,
                factory: Arc::clone(&factory),
                jobs: Arc::clone(&jobs),
                disposed: Arc::clone(&dispatcher.disposed),
                ready: ready.clone(),
                exited,
            };

            match worker::spawn(context) {
                Ok(thread) => lock(&dispatcher.workers).push(WorkerHandle {
                    id,
                    thread,
                    exited: exit_signal,
                }),
                Err(e) => {
                    dispatcher.dispose();
                    return Err(PipelineError::Startup(format!(
                        "could not spawn worker {}: {}",
                        id, e
                    )));
                }
            }
        }
        drop(ready);

        for _ in 0..config.workers {
            match readiness.recv() {
                Ok((_, Ok(()))) => {}
                Ok((id, Err(message))) => {
                    dispatcher.dispose();
                    return Err(PipelineError::Startup(format!(
                        "worker {} failed to start: {}",
                        id, message
                    )));
                }
                Err(_) => {
                    dispatcher.dispose();
                    return Err(PipelineError::Startup(
                        "a worker exited before reporting readiness".to_string(),
                    ));
                }
            }
        }

        *lock(&dispatcher.state) = DispatcherState::Running;
        info!(
            "Worker pool ready ({} workers, {} threads each)",
            config.workers, config.threads_per_core
        );
        Ok(dispatcher)
    }

    /// Hand one article to a worker and block until it has been processed
    ///
    /// Fails immediately with [`PipelineError::Disposed`] once disposal has
    /// begun. A submission caught in flight by disposal fails with the same
    /// error; one whose worker died fails with [`PipelineError::WorkerLost`].
    pub fn submit(&self, article: ArticleContent) -> Result<(), PipelineError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(PipelineError::Disposed);
        }

        let queue = lock(&self.queue).clone().ok_or(PipelineError::Disposed)?;
        let (done, completion) = mpsc::sync_channel(1);
        queue
            .send(Job::Extract(WorkerTask { article, done }))
            .map_err(|_| self.interrupted())?;
        drop(queue);

        completion.recv().map_err(|_| self.interrupted())
    }

    fn interrupted(&self) -> PipelineError {
        if self.disposed.load(Ordering::SeqCst) {
            PipelineError::Disposed
        } else {
            PipelineError::WorkerLost
        }
    }

    /// Stop every worker
    ///
    /// Raises the disposed flag, closes the queue, wakes idle workers and
    /// waits up to the dispose timeout for each of them to exit. A worker
    /// still busy after its timeout is abandoned. Calling `dispose` again is a
    /// no-op.
    pub fn dispose(&self) {
        {
            let mut state = lock(&self.state);
            if matches!(*state, DispatcherState::Disposing | DispatcherState::Disposed) {
                return;
            }
            *state = DispatcherState::Disposing;
        }

        info!("Disposing worker pool");
        self.disposed.store(true, Ordering::SeqCst);

        if let Some(queue) = lock(&self.queue).take() {
            // A full queue already holds work every worker will refuse
            for _ in 0..self.worker_count {
                let _ = queue.try_send(Job::Wake);
            }
        }

        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            match worker.exited.recv_timeout(self.dispose_timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if worker.thread.join().is_err() {
                        warn!("Worker {} panicked", worker.id);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Worker {} did not stop within {:?}; abandoning it",
                        worker.id, self.dispose_timeout
                    );
                }
            }
        }

        *lock(&self.state) = DispatcherState::Disposed;
        info!("Worker pool disposed");
    }

    /// Current lifecycle state
    pub fn state(&self) -> DispatcherState {
        *lock(&self.state)
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Submitter for ExtractionDispatcher {
    fn submit(&self, article: ArticleContent) -> Result<(), PipelineError> {
        ExtractionDispatcher::submit(self, article)
    }
}

impl Drop for ExtractionDispatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}
