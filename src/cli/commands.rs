//! Command handlers for the Argo broker CLI
//!
//! Each handler builds a broker from the loaded configuration and the
//! global flags, runs one query and prints the result as JSON.

use serde::Serialize;
use tracing::{debug, info};

use crate::app::broker::ArgoBroker;
use crate::cli::{DataArgs, FloatArgs, GlobalArgs};
use crate::config::AppConfig;
use crate::constants::queries;
use crate::errors::{AppError, Result};

/// Create a broker for the archive chosen on the command line or in the config
pub async fn build_broker(global: &GlobalArgs, app_config: &AppConfig) -> Result<ArgoBroker> {
    let mut config = app_config.to_runtime_config();
    if let Some(dir) = &global.cache_dir {
        config.cache.cache_root = Some(dir.clone());
    }

    let archive = global
        .archive
        .clone()
        .unwrap_or_else(|| app_config.broker.archive.clone());
    debug!("Using archive {}", archive);

    ArgoBroker::new(&archive, config).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::generic(format!("Failed to format result: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Handle the queries command
pub async fn handle_queries(global: &GlobalArgs, app_config: &AppConfig) -> Result<()> {
    let broker = build_broker(global, app_config).await?;
    print_json(&serde_json::json!({
        "archive": broker.archive().as_str(),
        "queries": broker.queries(),
    }))
}

/// Handle the meta command
pub async fn handle_meta(
    global: &GlobalArgs,
    app_config: &AppConfig,
    args: FloatArgs,
) -> Result<()> {
    let broker = build_broker(global, app_config).await?;
    let result = broker.execute(queries::META, Some(&args.to_params())).await?;
    info!("Metadata query for {}/{} complete", args.dac, args.float);

    let json = result
        .to_json()
        .map_err(|e| AppError::generic(format!("Failed to format result: {}", e)))?;
    print_json(&json)
}

/// Handle the data command
pub async fn handle_data(
    global: &GlobalArgs,
    app_config: &AppConfig,
    args: DataArgs,
) -> Result<()> {
    let broker = build_broker(global, app_config).await?;
    let result = broker.execute(queries::DATA, Some(&args.to_params())).await?;

    let stats = broker.cache().stats();
    info!(
        "Data query for {}/{} complete: {} downloaded, {} cached ({:.1}% hit rate)",
        args.float.dac,
        args.float.float,
        stats.downloads,
        stats.hits,
        stats.hit_rate()
    );

    let json = result
        .to_json()
        .map_err(|e| AppError::generic(format!("Failed to format result: {}", e)))?;
    print_json(&json)
}
