//! Counters collected during a pipeline run

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Thread-safe counters for one run
///
/// Every article listed in the backlog ends up counted exactly once as
/// completed, missing content or failed, unless the run timed out first.
#[derive(Debug, Default)]
pub struct RunMetrics {
    discovered: AtomicUsize,
    fetched: AtomicUsize,
    missing_content: AtomicUsize,
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicBool,
}

impl RunMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the size of the backlog
    pub fn record_discovered(&self, count: usize) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Record fetched article content
    pub fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an article skipped for lack of content
    pub fn record_missing_content(&self) {
        self.missing_content.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission to the worker pool
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed article, returning the running total
    pub fn record_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record an article dropped after a failure
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that the run hit its timeout
    pub fn mark_timed_out(&self) {
        self.timed_out.store(true, Ordering::Relaxed);
    }

    /// Articles listed in the backlog
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::Relaxed)
    }

    /// Articles whose content was fetched
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::Relaxed)
    }

    /// Articles skipped for lack of content
    pub fn missing_content(&self) -> usize {
        self.missing_content.load(Ordering::Relaxed)
    }

    /// Articles submitted to the worker pool
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Articles extracted and marked
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Articles dropped after a failure
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Whether the run hit its timeout
    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::Relaxed)
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Extraction Run Summary".to_string(),
            "======================".to_string(),
            format!("Discovered: {}", self.discovered()),
            format!("Fetched: {}", self.fetched()),
            format!("Missing content: {}", self.missing_content()),
            format!("Submitted: {}", self.submitted()),
            format!("Completed: {}", self.completed()),
            format!("Failed: {}", self.failed()),
            format!("Timed out: {}", if self.timed_out() { "yes" } else { "no" }),
        ];
        lines.join("\n")
    }
}
