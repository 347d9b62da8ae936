//! Configuration management for the Argo broker
//!
//! Settings are read from a TOML file when one is found and fall back to
//! built-in defaults otherwise. Every section and field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::broker::BrokerConfig;
use crate::app::cache::CacheConfig;
use crate::app::client::ClientConfig;
use crate::constants::{archive, cache, http, limits, logging};
use crate::errors::{AppError, ConfigError, ConfigResult, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Archive binding
    pub broker: BrokerConfigToml,
    /// Cache management settings
    pub cache: CacheConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfigToml {
    /// Archive used when none is given on the command line
    pub archive: String,
}

impl Default for BrokerConfigToml {
    fn default() -> Self {
        Self {
            archive: archive::IFREMER.to_string(),
        }
    }
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (system cache directory if absent)
    pub cache_root: Option<PathBuf>,
    /// Files downloaded concurrently within one query
    pub max_concurrent_downloads: usize,
    /// Queries allowed to use the cache at the same time
    pub max_sessions: usize,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            max_concurrent_downloads: cache::DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            max_sessions: cache::DEFAULT_MAX_SESSIONS,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries for transient HTTP failures
    pub max_retries: u32,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(30),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config_file_override` or the standard locations
    ///
    /// A missing file in the standard locations is not an error; a missing
    /// explicitly named file is.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./argo-broker.toml")];
        if let Some(path) = Self::get_default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Default config file path for the current user
    fn get_default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(cache::APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::generic(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if !archive::KNOWN_ARCHIVES.contains(&self.broker.archive.as_str()) {
            return Err(ConfigError::UnsupportedArchive {
                url: self.broker.archive.clone(),
            });
        }
        if self.client.rate_limit_rps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: "0".to_string(),
                reason: "Rate limit must be at least 1 request per second".to_string(),
            });
        }
        if self.client.max_retries > limits::MAX_CONFIGURED_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "client.max_retries".to_string(),
                value: self.client.max_retries.to_string(),
                reason: format!(
                    "At most {} retries are allowed",
                    limits::MAX_CONFIGURED_RETRIES
                ),
            });
        }
        if self.cache.max_concurrent_downloads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_concurrent_downloads".to_string(),
                value: "0".to_string(),
                reason: "At least one download must be allowed".to_string(),
            });
        }
        if self.cache.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_sessions".to_string(),
                value: "0".to_string(),
                reason: "At least one session must be allowed".to_string(),
            });
        }
        Ok(())
    }

    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> BrokerConfig {
        BrokerConfig::default()
            .with_cache(self.cache.to_runtime_config())
            .with_client(self.client.to_runtime_config())
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            max_concurrent_downloads: self.max_concurrent_downloads,
            max_sessions: self.max_sessions,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            rate_limit_rps: self.rate_limit_rps,
            max_retries: self.max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::ArchiveLocation;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.broker.archive, archive::IFREMER);
        assert_eq!(
            config.cache.max_concurrent_downloads,
            cache::DEFAULT_MAX_CONCURRENT_DOWNLOADS
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
[broker]
archive = "https://usgodae.org/pub/outgoing/argo"

[cache]
cache_root = "/data/argo-cache"
max_concurrent_downloads = 2

[client]
rate_limit_rps = 5
"#,
        )
        .unwrap();

        assert_eq!(config.broker.archive, archive::USGODAE);
        let runtime = config.to_runtime_config();
        assert_eq!(
            runtime.cache.cache_root,
            Some(PathBuf::from("/data/argo-cache"))
        );
        assert_eq!(runtime.cache.max_concurrent_downloads, 2);
        assert_eq!(runtime.client.rate_limit_rps, 5);
        assert_eq!(runtime.client.max_retries, limits::MAX_RETRIES);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml("[cache\nmax_sessions = ");
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let config = AppConfig::from_toml("[client]\nrate_limit_rps = 0\n").unwrap();
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "client.rate_limit_rps");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_unknown_archive() {
        let config =
            AppConfig::from_toml("[broker]\narchive = \"https://mirror.example/argo\"\n").unwrap();
        match config.validate() {
            Err(ConfigError::UnsupportedArchive { url }) => {
                assert_eq!(url, "https://mirror.example/argo");
            }
            other => panic!("Expected UnsupportedArchive, got {:?}", other),
        }
    }

    #[test]
    fn test_archive_list_cannot_be_extended() {
        // Only the two GDAC archives are accepted, whatever the file says
        let config = AppConfig::from_toml(
            "[broker]\narchive = \"https://usgodae.org/pub/outgoing/argo\"\narchives = [\"https://mirror.example/argo\"]\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let runtime = config.to_runtime_config();
        let result = ArchiveLocation::parse("https://mirror.example/argo");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedArchive { .. })
        ));
        assert!(ArchiveLocation::parse(&config.broker.archive).is_ok());
        assert_eq!(runtime.queries.len(), 2);
    }

    #[test]
    fn test_validate_rejects_excessive_retries() {
        let config = AppConfig::from_toml("[client]\nmax_retries = 64\n").unwrap();
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "client.max_retries");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("argo-broker.toml");
        tokio::fs::write(&path, "[cache]\nmax_sessions = 3\n")
            .await
            .unwrap();

        let config = AppConfig::load(Some(path)).await.unwrap();
        assert_eq!(config.cache.max_sessions, 3);
    }

    #[tokio::test]
    async fn test_load_missing_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(Some(temp_dir.path().join("absent.toml"))).await;
        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::NotFound { .. }))
        ));
    }
}
