//! Application constants for the Argo broker
//!
//! Constants are grouped by functional domain. Values that describe the remote
//! archive layout mirror the directory structure published by the Argo GDACs.

use std::time::Duration;

/// Known Argo global data assembly center archives
pub mod archive {
    /// Ifremer GDAC mirror
    pub const IFREMER: &str = "https://data-argo.ifremer.fr";

    /// US GODAE GDAC mirror
    pub const USGODAE: &str = "https://usgodae.org/pub/outgoing/argo";

    /// All archives a broker may be bound to
    pub const KNOWN_ARCHIVES: [&str; 2] = [IFREMER, USGODAE];

    /// Path segment under which data assembly centers are listed
    pub const DAC_SEGMENT: &str = "dac";

    /// Directory holding a float's per-cycle profile files
    pub const PROFILES_SEGMENT: &str = "profiles";
}

/// Query names served by the Argo broker
pub mod queries {
    /// Float metadata query
    pub const META: &str = "urn:pokapok:udal:argo:meta";

    /// Float profile data query
    pub const DATA: &str = "urn:pokapok:udal:argo:data";

    /// World Ocean Atlas query, registered but served by another broker
    pub const WOA23: &str = "urn:pokapok:udal:woa23:data";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Argo-Broker/0.1.0 (Ocean Data Access)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for archive requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;

    /// Maximum retry attempts for transient HTTP failures
    pub const MAX_RETRIES: u32 = 3;

    /// Upper bound accepted for configured retries
    pub const MAX_CONFIGURED_RETRIES: u32 = 10;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 500;

    /// Longest single backoff delay (milliseconds)
    pub const MAX_RETRY_DELAY_MS: u64 = 60_000;
}

/// Remote and local file naming
pub mod files {
    /// Extension of every Argo NetCDF file
    pub const NETCDF_EXTENSION: &str = "nc";

    /// Suffix of a float's metadata file stem
    pub const META_FILE_SUFFIX: &str = "_meta";

    /// Marker appended to the cycle number of descending profiles
    pub const DESCENDING_MARKER: &str = "D";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

/// Local cache layout
pub mod cache {
    /// Top-level directory of Argo files inside the cache root
    pub const ARGO_ROOT: &str = "argo";

    /// Application directory name under the OS cache directory
    pub const APP_DIR_NAME: &str = "argo-broker";

    /// Default number of files materialized concurrently within one batch
    pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

    /// Default number of batches holding the cache root at the same time
    pub const DEFAULT_MAX_SESSIONS: usize = 16;
}

/// Dataset layout
pub mod dataset {
    /// Record dimension along which profile files are concatenated
    pub const RECORD_DIMENSION: &str = "N_PROF";

    /// Fill value written into padded floating point cells
    pub const FLOAT_FILL: f64 = f64::NAN;

    /// Fill value written into padded integer cells (Argo convention)
    pub const INT_FILL: i64 = 99999;

    /// Fill value written into padded character cells
    pub const CHAR_FILL: u8 = b' ';
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use archive::{IFREMER as IFREMER_URL, KNOWN_ARCHIVES, USGODAE as USGODAE_URL};
pub use cache::DEFAULT_MAX_CONCURRENT_DOWNLOADS;
pub use dataset::RECORD_DIMENSION;
pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
