//! Argo broker CLI application
//!
//! Command-line interface for querying Argo float metadata and profile data.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use argo_broker::cli::{handle_data, handle_meta, handle_queries, Cli, Commands};
use argo_broker::config::AppConfig;
use argo_broker::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("{} error: {}", e.category(), e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let app_config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &app_config);

    info!("Argo broker v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Queries => handle_queries(&cli.global, &app_config).await,
        Commands::Meta(args) => {
            info!("Executing meta command");
            handle_meta(&cli.global, &app_config, args).await
        }
        Commands::Data(args) => {
            info!("Executing data command");
            handle_data(&cli.global, &app_config, args).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings and the configured level
fn init_logging(cli: &Cli, app_config: &AppConfig) {
    let default_level = app_config
        .logging
        .level
        .parse()
        .unwrap_or(tracing::Level::WARN);
    let log_level = cli.log_level(default_level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("argo_broker={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
