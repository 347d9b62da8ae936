//! Shared fixtures for integration tests: an in-memory archive and a
//! recording dataset reader.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use argo_broker::app::cache::{CacheConfig, CacheManager};
use argo_broker::app::client::Transport;
use argo_broker::app::dataset::{Dataset, DatasetReader, Values, Variable};
use argo_broker::app::{ArgoBroker, BrokerConfig, QueryParams};
use argo_broker::constants::archive;
use argo_broker::errors::{FormatError, FormatResult, RetrievalError, RetrievalResult};
use async_trait::async_trait;
use ndarray::{ArrayD, IxDyn};
use tempfile::TempDir;
use url::Url;

pub const FLOAT_DIR: &str = "https://data-argo.ifremer.fr/dac/aoml/1900722/";
pub const PROFILES_DIR: &str = "https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/";
pub const META_URL: &str = "https://data-argo.ifremer.fr/dac/aoml/1900722/1900722_meta.nc";

/// Apache style directory index linking `names`
pub fn listing_html(names: &[&str]) -> String {
    let rows: String = names
        .iter()
        .map(|name| format!("<tr><td><a href=\"{0}\">{0}</a></td></tr>\n", name))
        .collect();
    format!(
        "<html><body><table>\n\
         <tr><th><a href=\"?C=N;O=D\">Name</a></th></tr>\n\
         <tr><td><a href=\"/dac/aoml/\">Parent Directory</a></td></tr>\n\
         {}</table></body></html>",
        rows
    )
}

/// In-memory archive that counts every request
#[derive(Default)]
pub struct StubArchive {
    pages: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    pub page_requests: AtomicUsize,
    pub downloads: AtomicUsize,
}

impl StubArchive {
    pub fn with_page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    pub fn with_file(mut self, url: &str, body: &[u8]) -> Self {
        self.files.insert(url.to_string(), body.to_vec());
        self
    }

    /// Float 1900722 with the given profile files and its metadata file
    pub fn float_1900722(profiles: &[&str]) -> Self {
        let mut archive = Self::default()
            .with_page(PROFILES_DIR, listing_html(profiles))
            .with_file(META_URL, b"meta");
        for name in profiles {
            archive = archive.with_file(&format!("{}{}", PROFILES_DIR, name), name.as_bytes());
        }
        archive
    }

    pub fn network_calls(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst) + self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubArchive {
    async fn get_page(&self, url: &Url) -> RetrievalResult<String> {
        self.page_requests.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| RetrievalError::ServerError {
                url: url.to_string(),
                status: 404,
            })
    }

    async fn download_to(&self, url: &Url, destination: &Path) -> RetrievalResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let body = self
            .files
            .get(url.as_str())
            .ok_or_else(|| RetrievalError::ServerError {
                url: url.to_string(),
                status: 404,
            })?;
        tokio::fs::write(destination, body)
            .await
            .map_err(|source| RetrievalError::Write {
                url: url.to_string(),
                path: destination.to_path_buf(),
                source,
            })?;
        Ok(body.len() as u64)
    }
}

/// Reader that records the paths it opens
///
/// Metadata files yield a dataset with the usual global attributes; every
/// other file yields one profile whose cycle number is parsed from its name.
/// Both carry `PLATFORM_NUMBER`, per profile in profile files and once in the
/// metadata file, as real Argo files do.
#[derive(Default)]
pub struct RecordingReader {
    pub opened: Mutex<Vec<PathBuf>>,
}

impl RecordingReader {
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

pub fn metadata_dataset() -> Dataset {
    let mut dataset = Dataset::new();
    dataset.set_attribute("title", "Argo float metadata file");
    dataset.set_attribute("institution", "AOML");
    dataset.set_attribute("source", "Argo float");
    dataset.set_attribute("references", "http://www.argodatamgt.org/Documentation");
    dataset
        .push_variable(
            Variable::new(
                "PLATFORM_NUMBER",
                vec!["STRING8".to_string()],
                Values::Char(ArrayD::from_shape_vec(IxDyn(&[8]), b"1900722 ".to_vec()).unwrap()),
            )
            .unwrap(),
        )
        .unwrap();
    dataset
        .push_variable(
            Variable::new(
                "LAUNCH_LATITUDE",
                Vec::new(),
                Values::Float(ArrayD::from_elem(IxDyn(&[]), 27.5)),
            )
            .unwrap(),
        )
        .unwrap();
    dataset
}

fn profile_dataset(name: &str) -> Dataset {
    let cycle: i64 = name
        .trim_end_matches(".nc")
        .trim_end_matches('D')
        .rsplit('_')
        .next()
        .and_then(|c| c.parse().ok())
        .unwrap_or(-1);

    let mut dataset = Dataset::new();
    dataset.set_attribute("title", "Argo float vertical profile");
    dataset
        .push_variable(
            Variable::new(
                "CYCLE_NUMBER",
                vec!["N_PROF".to_string()],
                Values::Int(ArrayD::from_elem(IxDyn(&[1]), cycle)),
            )
            .unwrap(),
        )
        .unwrap();
    dataset
        .push_variable(
            Variable::new(
                "PLATFORM_NUMBER",
                vec!["N_PROF".to_string(), "STRING8".to_string()],
                Values::Char(
                    ArrayD::from_shape_vec(IxDyn(&[1, 8]), b"1900722 ".to_vec()).unwrap(),
                ),
            )
            .unwrap(),
        )
        .unwrap();
    dataset
}

impl DatasetReader for RecordingReader {
    fn open(&self, path: &Path) -> FormatResult<Dataset> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| FormatError::Open {
                path: path.to_path_buf(),
                reason: "no file name".to_string(),
            })?;
        if name.ends_with("_meta.nc") {
            Ok(metadata_dataset())
        } else {
            Ok(profile_dataset(name))
        }
    }
}

/// Broker over stub collaborators with its cache in `temp_dir`
pub async fn stub_broker(
    temp_dir: &TempDir,
    archive_stub: Arc<StubArchive>,
    reader: Arc<RecordingReader>,
) -> ArgoBroker {
    let cache = Arc::new(
        CacheManager::new(CacheConfig::with_cache_root(temp_dir.path().to_path_buf()))
            .await
            .unwrap(),
    );
    ArgoBroker::with_collaborators(
        archive::IFREMER,
        BrokerConfig::default(),
        archive_stub,
        cache,
        reader,
    )
    .unwrap()
}

pub fn params(value: serde_json::Value) -> QueryParams {
    value.as_object().cloned().unwrap()
}
