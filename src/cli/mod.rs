//! Command-line interface components
//!
//! This module contains CLI-specific code for the Argo broker application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DataArgs, FloatArgs, GlobalArgs};
pub use commands::{build_broker, handle_data, handle_meta, handle_queries};
