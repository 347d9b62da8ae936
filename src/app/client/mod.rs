//! HTTP client for Argo archive access
//!
//! The broker talks to the archive through the [`Transport`] trait so that
//! listing and download behaviour can be exercised without a network.
//! [`ArchiveClient`] is the production implementation.
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core HTTP operations with rate limiting and retries
//! - `download`: Streaming file downloads

use std::path::Path;

use async_trait::async_trait;
use url::Url;

use crate::errors::{ConfigResult, RetrievalResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;

use download::DownloadHandler;
use http::HttpHandler;

/// Remote access capability used by the listing resolver and the cache
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body of a page as text
    async fn get_page(&self, url: &Url) -> RetrievalResult<String>;

    /// Write the body of `url` to `destination`, returning the byte count
    async fn download_to(&self, url: &Url, destination: &Path) -> RetrievalResult<u64>;
}

/// HTTP client for Argo GDAC archives
#[derive(Debug)]
pub struct ArchiveClient {
    http_handler: HttpHandler,
}

impl ArchiveClient {
    /// Creates a client with default configuration
    pub fn new() -> ConfigResult<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Creates a client with custom configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the HTTP client cannot be built or the rate
    /// limit is zero
    pub fn with_config(config: &ClientConfig) -> ConfigResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, config.rate_limit_rps, config.max_retries)?;
        tracing::debug!(
            "Created archive client ({} rps, {} retries)",
            config.rate_limit_rps,
            config.max_retries
        );
        Ok(Self { http_handler })
    }
}

#[async_trait]
impl Transport for ArchiveClient {
    async fn get_page(&self, url: &Url) -> RetrievalResult<String> {
        self.http_handler.get_page(url).await
    }

    async fn download_to(&self, url: &Url, destination: &Path) -> RetrievalResult<u64> {
        DownloadHandler::new(&self.http_handler)
            .download_to(url, destination)
            .await
    }
}
