//! Core cache manager with atomic operations
//!
//! Remote files are materialized inside a [`CacheSession`], a scoped hold on
//! the cache root that is released when the session is dropped, whatever the
//! outcome of the batch. Each file is downloaded to a unique temporary path
//! and renamed into place only after the transfer completed, so a cache
//! lookup never sees partial data.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt, TryStreamExt};
use tokio::fs;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::app::client::Transport;
use crate::constants::cache;
use crate::errors::{Result, RetrievalResult, StorageError, StorageResult};

use super::config::CacheConfig;
use super::path::{CachePath, PathGenerator};
use super::reservation::{InFlightTable, ReservationStatus};
use super::stats::{CacheCounters, CacheStats};

/// Main cache management system
#[derive(Debug)]
pub struct CacheManager {
    config: CacheConfig,
    cache_root: PathBuf,
    in_flight: InFlightTable,
    sessions: Semaphore,
    next_session_id: AtomicU64,
    next_temp_id: AtomicU64,
    counters: CacheCounters,
}

impl CacheManager {
    /// Create a new cache manager
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the cache directory cannot be resolved or created
    pub async fn new(config: CacheConfig) -> StorageResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::get_default_cache_dir()?,
        };

        Self::ensure_directory_exists(&cache_root).await?;

        info!(
            "Initialized cache manager with root: {}",
            cache_root.display()
        );

        Ok(Self {
            sessions: Semaphore::new(config.max_sessions.max(1)),
            config,
            cache_root,
            in_flight: InFlightTable::new(),
            next_session_id: AtomicU64::new(1),
            next_temp_id: AtomicU64::new(0),
            counters: CacheCounters::default(),
        })
    }

    /// Get the cache root directory
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Get the cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Default cache directory for the current OS
    ///
    /// - macOS: ~/Library/Caches/argo-broker
    /// - Linux: ~/.cache/argo-broker
    /// - Windows: %LOCALAPPDATA%/argo-broker
    fn get_default_cache_dir() -> StorageResult<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| StorageError::NoCacheRoot {
                reason: "system cache directory is unknown".to_string(),
            })?
            .join(cache::APP_DIR_NAME);

        Ok(cache_dir)
    }

    async fn ensure_directory_exists(path: &Path) -> StorageResult<()> {
        if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(());
        }
        fs::create_dir_all(path).await.map_err(|source| {
            error!("Failed to create cache directory {}: {}", path.display(), source);
            StorageError::DirectoryNotAccessible {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("Created cache directory: {}", path.display());
        Ok(())
    }

    /// Local path of `url` inside `subtree`
    pub fn get_file_path(&self, subtree: &CachePath, url: &Url) -> RetrievalResult<PathBuf> {
        PathGenerator::get_file_path(&self.cache_root, subtree, url)
    }

    /// Acquire the cache root for one batch of materializations
    ///
    /// The returned session releases the root when dropped.
    pub async fn acquire(&self) -> StorageResult<CacheSession<'_>> {
        Self::ensure_directory_exists(&self.cache_root).await?;
        let permit = self
            .sessions
            .acquire()
            .await
            .map_err(|_| StorageError::SessionClosed {
                path: self.cache_root.clone(),
            })?;
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        debug!("Acquired cache session {} on {}", id, self.cache_root.display());

        Ok(CacheSession {
            manager: self,
            _permit: permit,
            id,
        })
    }

    /// Number of sessions currently holding the cache root
    pub fn active_sessions(&self) -> usize {
        self.config.max_sessions.max(1) - self.sessions.available_permits()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(
            self.cache_root.clone(),
            self.active_sessions(),
            self.in_flight.len(),
        )
    }

    async fn is_cached(path: &Path) -> bool {
        fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
    }

    async fn prepare_subtree(&self, subtree: &CachePath, create_subtree: bool) -> StorageResult<()> {
        let dir = subtree.directory(&self.cache_root);
        if create_subtree {
            return Self::ensure_directory_exists(&dir).await;
        }
        if fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            Ok(())
        } else {
            Err(StorageError::SubtreeMissing { path: dir })
        }
    }

    async fn materialize(
        &self,
        transport: &dyn Transport,
        url: &Url,
        subtree: &CachePath,
        create_subtree: bool,
    ) -> Result<(PathBuf, ReservationStatus)> {
        let final_path = self.get_file_path(subtree, url)?;
        self.prepare_subtree(subtree, create_subtree).await?;

        if Self::is_cached(&final_path).await {
            debug!("Cache hit: {}", final_path.display());
            self.counters.record_hit();
            return Ok((final_path, ReservationStatus::AlreadyExists));
        }

        let _reservation = self.in_flight.reserve(&final_path).await;

        // Another caller may have finished the download while we waited
        if Self::is_cached(&final_path).await {
            debug!("Cache hit after wait: {}", final_path.display());
            self.counters.record_hit();
            return Ok((final_path, ReservationStatus::AlreadyExists));
        }

        let temp_path = PathGenerator::get_temp_path(
            &final_path,
            self.next_temp_id.fetch_add(1, Ordering::Relaxed),
        );

        let bytes = match transport.download_to(url, &temp_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.counters.record_failure();
                Self::discard(&temp_path).await;
                error!("Download of {} failed: {}", url, e);
                return Err(e.into());
            }
        };

        if let Err(source) = fs::rename(&temp_path, &final_path).await {
            self.counters.record_failure();
            Self::discard(&temp_path).await;
            error!("Failed to publish {}: {}", final_path.display(), source);
            return Err(StorageError::AtomicOperationFailed {
                temp_path,
                final_path,
                source,
            }
            .into());
        }

        self.counters.record_download(bytes);
        info!("Cached {} ({} bytes)", final_path.display(), bytes);
        Ok((final_path, ReservationStatus::Downloaded { bytes }))
    }

    async fn discard(temp_path: &Path) {
        if let Err(e) = fs::remove_file(temp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove partial file {}: {}", temp_path.display(), e);
            }
        }
    }
}

/// Scoped hold on the cache root for one batch
#[derive(Debug)]
pub struct CacheSession<'a> {
    manager: &'a CacheManager,
    _permit: SemaphorePermit<'a>,
    id: u64,
}

impl CacheSession<'_> {
    /// Session identifier, unique per manager
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Ensure `url` is present under `subtree` and return its local path
    ///
    /// # Errors
    ///
    /// - `StorageError::SubtreeMissing` if the subtree is absent and
    ///   `create_subtree` is false
    /// - `RetrievalError` naming the URL if the download fails
    pub async fn materialize(
        &self,
        transport: &dyn Transport,
        url: &Url,
        subtree: &CachePath,
        create_subtree: bool,
    ) -> Result<PathBuf> {
        let (path, _) = self
            .manager
            .materialize(transport, url, subtree, create_subtree)
            .await?;
        Ok(path)
    }

    /// Materialize every URL, returning local paths in input order
    ///
    /// Up to `max_concurrent_downloads` files are processed at once. The
    /// first failure ends the batch.
    pub async fn materialize_all(
        &self,
        transport: &dyn Transport,
        urls: &[Url],
        subtree: &CachePath,
        create_subtree: bool,
    ) -> Result<Vec<PathBuf>> {
        let concurrency = self.manager.config.max_concurrent_downloads.max(1);
        let downloads: Vec<BoxFuture<'_, Result<PathBuf>>> = urls
            .iter()
            .map(|url| {
                self.materialize(transport, url, subtree, create_subtree)
                    .boxed()
            })
            .collect();
        futures::stream::iter(downloads)
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

impl Drop for CacheSession<'_> {
    fn drop(&mut self) {
        debug!("Released cache session {}", self.id);
    }
}
