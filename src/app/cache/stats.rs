//! Cache activity counters

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of cache activity since the manager was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Materializations served from an existing file
    pub hits: u64,
    /// Materializations that downloaded the file
    pub downloads: u64,
    /// Bytes written by downloads
    pub bytes_downloaded: u64,
    /// Downloads that failed and were discarded
    pub failures: u64,
    /// Sessions currently holding the cache root
    pub active_sessions: usize,
    /// Paths with a download in progress or awaited
    pub in_flight: usize,
}

impl CacheStats {
    /// Fraction of materializations served from the cache, in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.downloads;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

/// Live counters owned by the cache manager
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    downloads: AtomicU64,
    bytes_downloaded: AtomicU64,
    failures: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_download(&self, bytes: u64) {
        self.downloads.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        cache_root: PathBuf,
        active_sessions: usize,
        in_flight: usize,
    ) -> CacheStats {
        CacheStats {
            cache_root,
            hits: self.hits.load(Ordering::Relaxed),
            downloads: self.downloads.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            active_sessions,
            in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = CacheCounters::default();
        counters.record_hit();
        counters.record_download(10);
        counters.record_download(5);
        counters.record_failure();

        let stats = counters.snapshot(PathBuf::from("/cache"), 1, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.downloads, 2);
        assert_eq!(stats.bytes_downloaded, 15);
        assert_eq!(stats.failures, 1);
        assert!((stats.hit_rate() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_empty() {
        let stats = CacheCounters::default().snapshot(PathBuf::from("/cache"), 0, 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
