//! Local file cache for archive downloads
//!
//! Remote files are mirrored under a cache root so that a file is downloaded
//! at most once. Concurrent requests for the same file wait on a single
//! download, and finished files are published with a temp-file + rename so
//! partial data is never visible.
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`reservation`] - Per-file reservations preventing duplicate downloads
//! - [`path`] - Cache subtree keys and file path generation
//! - [`stats`] - Cache activity counters
//! - [`manager`] - Cache manager and scoped sessions
//!
//! # Examples
//!
//! ```rust,no_run
//! use argo_broker::app::cache::{CacheConfig, CacheManager, CachePath};
//! use argo_broker::app::client::ArchiveClient;
//! use argo_broker::app::models::FloatIdentity;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheManager::new(CacheConfig::default()).await?;
//! let client = ArchiveClient::new()?;
//! let float = FloatIdentity::new("aoml", "1900722")?;
//! let url = Url::parse("https://data-argo.ifremer.fr/dac/aoml/1900722/1900722_meta.nc")?;
//!
//! let session = cache.acquire().await?;
//! let path = session
//!     .materialize(&client, &url, &CachePath::float(&float), true)
//!     .await?;
//! println!("Cached at {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod path;
pub mod reservation;
pub mod stats;

// Re-export main public API
pub use config::CacheConfig;
pub use manager::{CacheManager, CacheSession};
pub use path::{CachePath, PathGenerator};
pub use stats::CacheStats;
