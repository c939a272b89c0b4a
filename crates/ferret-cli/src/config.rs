//! Configuration management for the CLI.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then command-line flags and environment variables (including a `.env`
//! file loaded at startup).

use crate::cli::Overrides;
use crate::error::{CliError, Result};
use ferret_domain::IndicatorTypeTable;
use ferret_extractor::ExtractorConfig;
use ferret_pipeline::PipelineConfig;
use ferret_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Effective configuration of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection settings
    pub database: DatabaseSettings,

    /// Worker pool and orchestrator settings
    pub pipeline: PipelineConfig,

    /// Extraction engine settings
    pub extractor: ExtractorConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Relational database URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Article content database URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,

    /// Connections per pool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

impl Config {
    /// Load configuration from a TOML file, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line and environment overrides.
    pub fn apply(&mut self, overrides: &Overrides) -> Result<()> {
        if let Some(url) = &overrides.database_url {
            self.database.url = Some(url.clone());
        }
        if let Some(url) = &overrides.content_database_url {
            self.database.content_url = Some(url.clone());
        }
        if let Some(max) = overrides.max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(retries) = overrides.max_retries {
            self.pipeline.max_retries = retries;
            self.extractor.max_retries = retries;
        }
        if let Some(threads) = overrides.threads_per_core {
            self.pipeline.threads_per_core = threads;
        }
        if let Some(workers) = overrides.workers {
            self.pipeline.workers = workers;
        }
        if let Some(timeout) = overrides.timeout {
            self.pipeline.run_timeout_secs = timeout;
        }
        if let Some(frequency) = overrides.log_frequency {
            self.pipeline.log_frequency = frequency;
        }
        if let Some(size) = overrides.source_filter_cache_size {
            self.extractor.source_filter_cache_size = size;
        }
        if let Some(types) = &overrides.indicator_types {
            self.extractor.indicator_types =
                IndicatorTypeTable::parse_overrides(types).map_err(CliError::Config)?;
        }
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate().map_err(CliError::Config)?;
        self.extractor.validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// Build the store configuration; fails when no database URL is set.
    pub fn store_config(&self) -> Result<StoreConfig> {
        let url = self.database.url.as_deref().ok_or_else(|| {
            CliError::Config("no database URL (set DATABASE_URL or [database].url)".into())
        })?;

        let mut store = StoreConfig::new(url);
        store.content_database_url = self.database.content_url.clone();
        if let Some(max) = self.database.max_connections {
            store.max_connections = max;
        }
        store.validate().map_err(CliError::Config)?;
        Ok(store)
    }

    /// Render the configuration as TOML with credentials masked.
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.database.url = shown.database.url.as_deref().map(redact);
        shown.database.content_url = shown.database.content_url.as_deref().map(redact);
        toml::to_string_pretty(&shown)
            .map_err(|e| CliError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

/// Mask the user info of a connection URL.
fn redact(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
