//! Core application logic for the Argo broker
//!
//! The pipeline of a query, leaves first: [`pattern`] turns filters into a
//! file name rule, [`listing`] finds candidate remote files, [`selector`]
//! applies the rule, [`cache`] materializes the files locally through the
//! [`client`] transport, and [`dataset`] merges them. [`broker`] composes
//! these per named query.
//!
//! # Examples
//!
//! ```rust,no_run
//! use argo_broker::app::{ArgoBroker, BrokerConfig, QueryParams};
//! use argo_broker::constants::queries;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = ArgoBroker::new("https://data-argo.ifremer.fr", BrokerConfig::default()).await?;
//!
//! let params: QueryParams = json!({"dac": "aoml", "float": "1900722"})
//!     .as_object()
//!     .cloned()
//!     .unwrap_or_default();
//! let result = broker.execute(queries::META, Some(&params)).await?;
//! if let Some(meta) = result.metadata() {
//!     println!("{:?} {:?}", meta.institution, meta.variables);
//! }
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod cache;
pub mod client;
pub mod dataset;
pub mod listing;
pub mod models;
pub mod pattern;
pub mod registry;
pub mod selector;

// Re-export main public API
pub use broker::{ArgoBroker, BrokerConfig, Payload, QueryResult};
pub use cache::{CacheConfig, CacheManager, CachePath, CacheStats};
pub use client::{ArchiveClient, ClientConfig, Transport};
pub use dataset::{Dataset, DatasetMerger, DatasetReader, FloatMetadata};
pub use listing::ListingResolver;
pub use models::{
    ArchiveLocation, FloatIdentity, FloatMode, FloatType, FloatTypeFilter, QueryParams,
};
pub use pattern::{enum_alternation, FileNamePattern};
pub use registry::{NamedQueryInfo, QueryRegistry};
pub use selector::select_files;
