//! Error types for the Argo broker
//!
//! Every failure of a query maps onto one of six concerns: configuration,
//! parameter validation, query dispatch, remote retrieval, local storage, and
//! dataset format. Each concern has its own enum so that callers can match on
//! the failing stage, and [`AppError`] wraps them all for the `execute` entry
//! point.

use std::path::PathBuf;
use thiserror::Error;

/// Broker construction and internal configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Archive address is not one of the known Argo archives
    #[error("Unsupported Argo archive URL: {url}")]
    UnsupportedArchive { url: String },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Float type filter that cannot be turned into a file name pattern
    #[error("Invalid float type filter: {reason}")]
    InvalidFloatType { reason: String },

    /// Generated file name pattern failed to compile
    #[error("Invalid file name pattern {pattern}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Query parameter validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Required parameter missing from the request
    #[error("missing {field} argument")]
    MissingField { field: String },

    /// Parameter present but unusable
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Query name dispatch errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// Name is not present in the query registry at all
    #[error("unknown query name \"{name}\"")]
    Unknown { name: String },

    /// Name is registered but served by a different broker
    #[error("unsupported query name \"{name}\"")]
    Unsupported { name: String },
}

/// Remote retrieval errors (listing pages and file downloads)
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// HTTP request error
    #[error("HTTP request failed for {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server returned an error status
    #[error("Server error for {url}: HTTP {status}")]
    ServerError { url: String, status: u16 },

    /// Rate limit exceeded after retries
    #[error("Rate limit exceeded for {url}. Server responded with HTTP 429")]
    RateLimitExceeded { url: String },

    /// Server overloaded after retries
    #[error("Server overloaded for {url}. Server responded with HTTP 503")]
    ServerOverloaded { url: String },

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for {url}")]
    MaxRetriesExceeded { url: String, max_retries: u32 },

    /// Body shorter or longer than the announced length
    #[error("Incomplete download of {url}: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload {
        url: String,
        received: u64,
        expected: u64,
    },

    /// Local write failed while streaming a download
    #[error("Failed to write download of {url} to {path}")]
    Write {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid URL built or discovered
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Profile directory listing could not be fetched or parsed
    #[error("Failed to list profile directory {url}: {reason}")]
    Listing { url: String, reason: String },
}

/// Local cache storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Cache root could not be created or accessed
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Subtree missing and creation was not requested
    #[error("Cache subtree does not exist: {path}")]
    SubtreeMissing { path: PathBuf },

    /// Cache root could not be resolved from the environment
    #[error("Cache root could not be determined: {reason}")]
    NoCacheRoot { reason: String },

    /// Downloaded file could not be moved into place
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache session permits are no longer available
    #[error("Cache session could not be acquired for {path}")]
    SessionClosed { path: PathBuf },
}

/// Dataset reading and merging errors
#[derive(Error, Debug)]
pub enum FormatError {
    /// File could not be opened as a dataset
    #[error("Failed to open dataset {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    /// Variable has a shape incompatible with the merged dataset
    #[error("Incompatible variable {variable} in {path}: {reason}")]
    IncompatibleVariable {
        path: PathBuf,
        variable: String,
        reason: String,
    },

    /// Variable data does not match its declared dimensions
    #[error("Variable {variable} has {actual} values, dimensions require {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// No dataset reader is compiled into this build
    #[error("No dataset reader available for {path}; rebuild with the `netcdf` feature")]
    ReaderUnavailable { path: PathBuf },
}

/// Top-level error returned by the broker
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Query dispatch error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Retrieval error
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Format error
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is transient and the request may succeed later
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Retrieval(RetrievalError::Http { .. })
                | AppError::Retrieval(RetrievalError::RateLimitExceeded { .. })
                | AppError::Retrieval(RetrievalError::ServerOverloaded { .. })
                | AppError::Retrieval(RetrievalError::IncompleteDownload { .. })
                | AppError::Retrieval(RetrievalError::Listing { .. })
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
            AppError::Query(_) => "query",
            AppError::Retrieval(_) => "retrieval",
            AppError::Storage(_) => "storage",
            AppError::Format(_) => "format",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Validation result type alias
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Retrieval result type alias
pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Format result type alias
pub type FormatResult<T> = std::result::Result<T, FormatError>;
