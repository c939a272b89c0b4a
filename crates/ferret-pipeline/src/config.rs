//! Configuration for the worker pool and the orchestrator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a pipeline run
///
/// # Examples
///
/// ```
/// use ferret_pipeline::PipelineConfig;
///
/// let config = PipelineConfig {
///     workers: 4,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(config.orchestrator_concurrency(), 12);
/// assert_eq!(config.run_timeout().as_secs(), 3 * 60 * 60);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of worker contexts
    /// Default: one per available CPU
    pub workers: usize,

    /// Threads per worker runtime, also the orchestrator's per-worker fan-out
    /// Default: 3
    pub threads_per_core: usize,

    /// Budget for a whole run (in seconds)
    /// Default: 10800 (3 hours)
    pub run_timeout_secs: u64,

    /// Log a progress line every this many completed articles
    /// Default: 25
    pub log_frequency: usize,

    /// Additional attempts after a failed storage call
    /// Default: 3
    pub max_retries: u32,

    /// How long disposal waits for each worker to stop (in seconds)
    /// Default: 10
    pub dispose_timeout_secs: u64,
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl PipelineConfig {
    /// Get the run timeout as a Duration
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Get the per-worker dispose timeout as a Duration
    pub fn dispose_timeout(&self) -> Duration {
        Duration::from_secs(self.dispose_timeout_secs)
    }

    /// Articles the orchestrator keeps in flight at once
    pub fn orchestrator_concurrency(&self) -> usize {
        self.threads_per_core * self.workers
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        if self.threads_per_core == 0 {
            return Err("threads_per_core must be greater than 0".to_string());
        }
        if self.run_timeout_secs == 0 {
            return Err("run_timeout_secs must be greater than 0".to_string());
        }
        if self.log_frequency == 0 {
            return Err("log_frequency must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: available_cpus(),
            threads_per_core: 3,
            run_timeout_secs: 10_800,
            log_frequency: 25,
            max_retries: 3,
            dispose_timeout_secs: 10,
        }
    }
}
