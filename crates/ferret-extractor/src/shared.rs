//! Single-flight memoized async computation

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

enum Slot<T> {
    Pending,
    Ready(Arc<T>),
    Empty,
}

/// An eagerly started async computation whose single result is replayed
///
/// The producer is spawned the moment the computation is created, runs
/// exactly once, and its result (or its absence) is handed to every caller
/// of [`get`](Self::get), including callers that arrive before it resolves.
/// Clones share the same underlying result.
///
/// # Examples
///
/// ```
/// use ferret_extractor::SharedComputation;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let rules = SharedComputation::connect(async { Some(vec!["malware", "phishing"]) });
/// let again = rules.clone();
///
/// assert_eq!(rules.get().await.unwrap().len(), 2);
/// assert!(again.is_resolved());
/// # }
/// ```
pub struct SharedComputation<T> {
    rx: watch::Receiver<Slot<T>>,
}

impl<T> Clone for SharedComputation<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> SharedComputation<T> {
    /// Start the producer on the current tokio runtime
    ///
    /// A producer resolving to `None` leaves the computation empty for good;
    /// it is not run again.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn connect<F>(producer: F) -> Self
    where
        F: Future<Output = Option<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Slot::Pending);
        tokio::spawn(async move {
            let slot = match producer.await {
                Some(value) => Slot::Ready(Arc::new(value)),
                None => Slot::Empty,
            };
            // Nobody left to tell when every handle is gone
            let _ = tx.send(slot);
        });
        Self { rx }
    }

    /// A computation that is already resolved
    pub fn ready(value: T) -> Self {
        let (_tx, rx) = watch::channel(Slot::Ready(Arc::new(value)));
        Self { rx }
    }

    /// Wait for the result
    ///
    /// Returns `None` when the producer produced nothing or never finished
    /// (it panicked or its runtime shut down).
    pub async fn get(&self) -> Option<Arc<T>> {
        let mut rx = self.rx.clone();
        let slot = rx.wait_for(|slot| !matches!(slot, Slot::Pending)).await.ok()?;
        match &*slot {
            Slot::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    /// Whether the producer has finished
    pub fn is_resolved(&self) -> bool {
        !matches!(*self.rx.borrow(), Slot::Pending)
    }
}
