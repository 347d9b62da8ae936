//! Prelude module for the Argo broker library
//!
//! Re-exports the items needed for typical usage with a single
//! `use argo_broker::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use argo_broker::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let broker = ArgoBroker::new(archive::IFREMER, BrokerConfig::default()).await?;
//!     for query in broker.queries() {
//!         println!("{}", query.name);
//!     }
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    ArgoBroker, BrokerConfig, CacheConfig, CacheManager, ClientConfig, Dataset, DatasetReader,
    FloatIdentity, FloatMetadata, FloatMode, FloatType, FloatTypeFilter, NamedQueryInfo, Payload,
    QueryParams, QueryResult, Transport,
};
pub use crate::constants::{archive, queries};
