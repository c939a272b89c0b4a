//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ferret - extract indicators of compromise and categories from scraped articles.
#[derive(Debug, Parser)]
#[command(name = "ferret")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(short, long, global = true, env = "FERRET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true, env = "FERRET_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract features from every unextracted article (default)
    Run,

    /// Create the tables the pipeline reads and writes
    InitSchema,

    /// Validate and print the effective configuration
    CheckConfig,
}

/// Settings that override the configuration file, usually set through the environment.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Relational database URL
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Article content database URL (defaults to the relational database)
    #[arg(long, global = true, env = "CONTENT_DATABASE_URL", hide_env_values = true)]
    pub content_database_url: Option<String>,

    /// Connections per pool
    #[arg(long, global = true, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Additional attempts after a failed storage call
    #[arg(long, global = true, env = "DB_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Threads per worker runtime
    #[arg(long, global = true, env = "THREADS_PER_CORE")]
    pub threads_per_core: Option<usize>,

    /// Number of workers (defaults to the CPU count)
    #[arg(long, global = true, env = "WORKER_COUNT")]
    pub workers: Option<usize>,

    /// Run timeout in seconds
    #[arg(long, global = true, env = "PROGRAM_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Log progress every this many completed articles
    #[arg(long, global = true, env = "LOG_FREQUENCY")]
    pub log_frequency: Option<usize>,

    /// Sources whose filters are kept in memory per worker
    #[arg(long, global = true, env = "SOURCE_FILTER_CACHE_SIZE")]
    pub source_filter_cache_size: Option<usize>,

    /// Indicator kind to type id table (format: url=1,ip4=3,...)
    #[arg(long, global = true, env = "INDICATOR_TYPES")]
    pub indicator_types: Option<String>,
}
