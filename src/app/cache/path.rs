//! Cache subtree keys and local path generation
//!
//! Files are stored under `{cache_root}/argo/dac/{dac}/{float}/` (metadata)
//! and `{cache_root}/argo/dac/{dac}/{float}/profiles/` (profiles), keeping
//! the remote file name.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::app::models::{url_file_name, FloatIdentity};
use crate::constants::{archive, cache, files};
use crate::errors::{RetrievalError, RetrievalResult};

/// Relative directory inside the cache root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePath {
    relative: PathBuf,
}

impl CachePath {
    /// Subtree of a float's metadata file: `argo/dac/<dac>/<float>`
    pub fn float(float: &FloatIdentity) -> Self {
        let relative = Path::new(cache::ARGO_ROOT)
            .join(archive::DAC_SEGMENT)
            .join(float.dac())
            .join(float.float());
        Self { relative }
    }

    /// Subtree of a float's profile files: `argo/dac/<dac>/<float>/profiles`
    pub fn profiles(float: &FloatIdentity) -> Self {
        let mut path = Self::float(float);
        path.relative.push(archive::PROFILES_SEGMENT);
        path
    }

    pub fn as_path(&self) -> &Path {
        &self.relative
    }

    /// Absolute directory of this subtree under `cache_root`
    pub fn directory(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(&self.relative)
    }
}

impl fmt::Display for CachePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative.display())
    }
}

/// Path generation utility for cache files
pub struct PathGenerator;

impl PathGenerator {
    /// Local path of `url` inside `subtree`
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::InvalidUrl` if the URL has no file name or the
    /// file name is not a plain path component
    pub fn get_file_path(
        cache_root: &Path,
        subtree: &CachePath,
        url: &Url,
    ) -> RetrievalResult<PathBuf> {
        let name = url_file_name(url)
            .filter(|name| *name != "." && *name != ".." && !name.contains('\\'))
            .ok_or_else(|| RetrievalError::InvalidUrl {
                url: url.to_string(),
                error: "URL does not name a file".to_string(),
            })?;
        Ok(subtree.directory(cache_root).join(name))
    }

    /// Unique sibling path used while a download is in progress
    ///
    /// Combines the process id with a per-process counter so concurrent
    /// writers, including other processes sharing the cache, never collide.
    pub fn get_temp_path(final_path: &Path, sequence: u64) -> PathBuf {
        let mut name = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(
            ".{}.{}{}",
            std::process::id(),
            sequence,
            files::TEMP_FILE_SUFFIX
        ));
        final_path.with_file_name(name)
    }

    /// Check if a path is an in-progress download
    pub fn is_temp_path(path: &Path) -> bool {
        path.to_string_lossy().ends_with(files::TEMP_FILE_SUFFIX)
    }
}
