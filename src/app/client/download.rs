//! Streaming file downloads
//!
//! The body is streamed chunk by chunk into the destination file and the
//! received byte count is compared against `Content-Length` when the server
//! announces one. Publishing the file under its final name is the caller's
//! job; this handler only ever writes the path it is given.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::app::client::http::HttpHandler;
use crate::errors::{RetrievalError, RetrievalResult};

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Stream `url` into `destination`, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError` if the request fails, the status is not a
    /// success, the body is truncated, or the file cannot be written. The
    /// destination may hold partial data after an error.
    pub async fn download_to(&self, url: &Url, destination: &Path) -> RetrievalResult<u64> {
        let response = self.http_handler.get_success(url).await?;
        let expected = response.content_length();

        let write_err = |source: std::io::Error| RetrievalError::Write {
            url: url.to_string(),
            path: destination.to_path_buf(),
            source,
        };

        let mut file = File::create(destination).await.map_err(write_err)?;
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| RetrievalError::Http {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await.map_err(write_err)?;
            received += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        if let Some(expected) = expected {
            if received != expected {
                return Err(RetrievalError::IncompleteDownload {
                    url: url.to_string(),
                    received,
                    expected,
                });
            }
        }

        tracing::debug!("Downloaded {} bytes from {}", received, url);
        Ok(received)
    }
}
