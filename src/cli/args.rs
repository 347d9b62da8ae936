//! Command-line argument parsing for the Argo broker
//!
//! This module defines the CLI structure using clap derive macros. Each
//! query subcommand maps its flags onto the string-keyed parameters the
//! broker's `execute` accepts.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use crate::app::models::QueryParams;

/// Argo broker - query Argo float metadata and profile data
#[derive(Parser, Debug)]
#[command(
    name = "argo_broker",
    version,
    about = "Query Argo float metadata and profile data from the GDAC archives",
    long_about = "Retrieves Argo float files from an HTTP GDAC archive into a local cache and
reports float metadata or the merged profile dataset as JSON."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Archive base URL (defaults to the configured archive)
    #[arg(long, global = true, value_name = "URL")]
    pub archive: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the queries served for the archive
    Queries,

    /// Show the metadata of a float
    Meta(FloatArgs),

    /// Merge the profile files of a float into one dataset
    Data(DataArgs),
}

/// Float selection shared by the query commands
#[derive(Args, Debug, Clone)]
pub struct FloatArgs {
    /// Data assembly center code (e.g. "aoml")
    #[arg(long)]
    pub dac: String,

    /// Float identifier (e.g. "1900722")
    #[arg(long)]
    pub float: String,
}

/// Arguments for the data command
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    #[command(flatten)]
    pub float: FloatArgs,

    /// Processing mode: R, D or A (any if omitted)
    #[arg(long)]
    pub mode: Option<String>,

    /// File type: core, B, M or S; repeat for several (any if omitted)
    #[arg(long = "type", value_name = "TYPE")]
    pub float_types: Vec<String>,

    /// Exclude descending-cycle profiles
    #[arg(long)]
    pub no_descending: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level from the verbosity flags, or `default` if none is set
    pub fn log_level(&self, default: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            default
        }
    }
}

impl FloatArgs {
    /// Query parameters naming the float
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("dac".to_string(), Value::String(self.dac.clone()));
        params.insert("float".to_string(), Value::String(self.float.clone()));
        params
    }
}

impl DataArgs {
    /// Query parameters for the data query
    pub fn to_params(&self) -> QueryParams {
        let mut params = self.float.to_params();
        if let Some(mode) = &self.mode {
            params.insert("float_mode".to_string(), Value::String(mode.clone()));
        }
        match self.float_types.as_slice() {
            [] => {}
            [single] => {
                params.insert("float_type".to_string(), Value::String(single.clone()));
            }
            many => {
                params.insert(
                    "float_type".to_string(),
                    Value::Array(many.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        params.insert(
            "descending_cycles".to_string(),
            Value::Bool(!self.no_descending),
        );
        params
    }
}
