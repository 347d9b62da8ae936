//! Per-file reservation table preventing duplicate downloads
//!
//! Every local cache path has at most one in-flight download. A caller that
//! wants to fill a path reserves it first; concurrent callers for the same
//! path wait on the same lock and, once it is released, find the finished
//! file instead of downloading it again.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Outcome of materializing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReservationStatus {
    /// File was already present in the cache
    AlreadyExists,
    /// File was downloaded by this call
    Downloaded { bytes: u64 },
}

type LockMap = HashMap<PathBuf, Arc<Mutex<()>>>;

/// Keyed lock table for in-flight downloads
#[derive(Debug, Default)]
pub struct InFlightTable {
    entries: StdMutex<LockMap>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, LockMap> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait until `key` is free and hold it until the reservation is dropped
    pub async fn reserve(&self, key: &Path) -> Reservation<'_> {
        let lock = {
            let mut entries = self.lock_entries();
            Arc::clone(
                entries
                    .entry(key.to_path_buf())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        // Created before waiting so a cancelled wait still cleans up the entry
        let mut reservation = Reservation {
            table: self,
            key: key.to_path_buf(),
            lock,
            guard: None,
        };
        let guard = Arc::clone(&reservation.lock).lock_owned().await;
        reservation.guard = Some(guard);
        reservation
    }

    /// Number of paths currently reserved or awaited
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive hold on one cache path
#[derive(Debug)]
pub struct Reservation<'a> {
    table: &'a InFlightTable,
    key: PathBuf,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Reservation<'_> {
    pub fn key(&self) -> &Path {
        &self.key
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut entries = self.table.lock_entries();
        // Only the table and this reservation still reference the lock
        if Arc::strong_count(&self.lock) == 2 {
            entries.remove(&self.key);
        }
    }
}
