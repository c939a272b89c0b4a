//! Ferret CLI - Feature extraction over scraped articles.

use clap::Parser;
use ferret_cli::commands;
use ferret_cli::{Cli, Command, Config, LogFormat};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: info for ferret crates)
fn init_logging(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ferret=info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> ferret_cli::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(&cli.overrides)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let metrics = commands::execute_run(&config).await?;
            println!("{}", metrics.summary());
        }
        Command::InitSchema => commands::execute_init_schema(&config).await?,
        Command::CheckConfig => commands::execute_check_config(&config)?,
    }

    Ok(())
}
