//! Argo Broker Library
//!
//! A Rust library for querying Argo float metadata and profile data from the
//! GDAC HTTP archives. Remote files are cached locally with download
//! deduplication and profile files are merged into one dataset per query.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
