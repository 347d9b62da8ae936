//! Query broker for Argo float archives
//!
//! [`ArgoBroker`] is bound to one archive for its whole lifetime and serves
//! two named queries: float metadata and merged float profile data. Each
//! query runs as a sequential pipeline of listing, selection, caching and
//! merging.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::app::cache::{CacheConfig, CacheManager, CachePath};
use crate::app::client::{ArchiveClient, ClientConfig, Transport};
use crate::app::dataset::{
    default_reader, Dataset, DatasetMerger, DatasetReader, DatasetSummary, FloatMetadata,
};
use crate::app::listing::ListingResolver;
use crate::app::models::{
    descending_cycles_from_params, ArchiveLocation, FloatIdentity, FloatMode, FloatTypeFilter,
    QueryParams,
};
use crate::app::pattern::FileNamePattern;
use crate::app::registry::{NamedQueryInfo, QueryRegistry};
use crate::app::selector::select_files;
use crate::constants::queries;
use crate::errors::{AppError, QueryError, Result};

/// Immutable broker configuration
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Query names served by this broker
    pub queries: Vec<String>,
    pub cache: CacheConfig,
    pub client: ClientConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queries: vec![queries::META.to_string(), queries::DATA.to_string()],
            cache: CacheConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl BrokerConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }
}

/// Query payload
#[derive(Debug, Clone)]
pub enum Payload {
    Metadata(FloatMetadata),
    Data(Dataset),
}

/// Result of `execute`: the query descriptor and its payload
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub query: NamedQueryInfo,
    pub payload: Payload,
}

/// JSON shape of a query result
#[derive(Debug, Serialize)]
struct QueryResultJson<'a> {
    query: &'a NamedQueryInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a FloatMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<DatasetSummary>,
}

impl QueryResult {
    pub fn metadata(&self) -> Option<&FloatMetadata> {
        match &self.payload {
            Payload::Metadata(meta) => Some(meta),
            Payload::Data(_) => None,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.payload {
            Payload::Data(dataset) => Some(dataset),
            Payload::Metadata(_) => None,
        }
    }

    /// JSON report; datasets are reported as their outline
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(QueryResultJson {
            query: &self.query,
            metadata: self.metadata(),
            data: self.dataset().map(Dataset::summary),
        })
    }
}

/// Data access broker for one Argo archive
pub struct ArgoBroker {
    config: BrokerConfig,
    registry: QueryRegistry,
    resolver: ListingResolver,
    transport: Arc<dyn Transport>,
    cache: Arc<CacheManager>,
    reader: Arc<dyn DatasetReader>,
}

impl std::fmt::Debug for ArgoBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgoBroker")
            .field("archive", self.resolver.archive())
            .field("queries", &self.config.queries)
            .field("cache_root", &self.cache.cache_root())
            .finish_non_exhaustive()
    }
}

impl ArgoBroker {
    /// Create a broker bound to `archive_url` with the production collaborators
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnsupportedArchive` if the URL is not a known archive
    /// - `StorageError` if the cache root cannot be created
    pub async fn new(archive_url: &str, config: BrokerConfig) -> Result<Self> {
        let archive = ArchiveLocation::parse(archive_url)?;
        let transport: Arc<dyn Transport> = Arc::new(ArchiveClient::with_config(&config.client)?);
        let cache = Arc::new(CacheManager::new(config.cache.clone()).await?);
        info!("Broker bound to {}", archive);
        Ok(Self::assemble(archive, config, transport, cache, default_reader()))
    }

    /// Create a broker with caller-provided collaborators
    pub fn with_collaborators(
        archive_url: &str,
        config: BrokerConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<CacheManager>,
        reader: Arc<dyn DatasetReader>,
    ) -> Result<Self> {
        let archive = ArchiveLocation::parse(archive_url)?;
        Ok(Self::assemble(archive, config, transport, cache, reader))
    }

    fn assemble(
        archive: ArchiveLocation,
        config: BrokerConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<CacheManager>,
        reader: Arc<dyn DatasetReader>,
    ) -> Self {
        Self {
            config,
            registry: QueryRegistry::standard(),
            resolver: ListingResolver::new(archive),
            transport,
            cache,
            reader,
        }
    }

    pub fn archive(&self) -> &ArchiveLocation {
        self.resolver.archive()
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Names of the queries served by this broker
    pub fn query_names(&self) -> Vec<String> {
        self.config.queries.clone()
    }

    /// Descriptors of the queries served by this broker
    pub fn queries(&self) -> Vec<NamedQueryInfo> {
        self.config
            .queries
            .iter()
            .filter_map(|name| self.registry.get(name).cloned())
            .collect()
    }

    /// Run a named query
    ///
    /// # Errors
    ///
    /// - `QueryError::Unknown` if no broker knows the name
    /// - `QueryError::Unsupported` if the name belongs to another broker
    /// - `ValidationError` for missing or malformed parameters, before any
    ///   network access
    /// - `RetrievalError`, `StorageError` or `FormatError` from the pipeline
    pub async fn execute(&self, name: &str, params: Option<&QueryParams>) -> Result<QueryResult> {
        let query = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::Unknown {
                name: name.to_string(),
            })?;
        if !self.config.queries.iter().any(|q| q == name) {
            return Err(QueryError::Unsupported {
                name: name.to_string(),
            }
            .into());
        }

        let empty = QueryParams::new();
        let params = params.unwrap_or(&empty);
        debug!("Executing {} with {:?}", name, params);

        let payload = match name {
            queries::META => Payload::Metadata(self.execute_meta(params).await?),
            queries::DATA => Payload::Data(self.execute_data(params).await?),
            _ => {
                return Err(QueryError::Unsupported {
                    name: name.to_string(),
                }
                .into())
            }
        };

        Ok(QueryResult { query, payload })
    }

    async fn execute_meta(&self, params: &QueryParams) -> Result<FloatMetadata> {
        let float = FloatIdentity::from_params(params)?;
        let urls = self.resolver.metadata_locations(&float)?;

        let paths = {
            let session = self.cache.acquire().await?;
            session
                .materialize_all(self.transport.as_ref(), &urls, &CachePath::float(&float), true)
                .await?
        };
        let path = paths
            .into_iter()
            .next()
            .ok_or_else(|| AppError::generic(format!("No metadata file for float {}", float)))?;

        let reader = Arc::clone(&self.reader);
        let dataset = tokio::task::spawn_blocking(move || reader.open(&path))
            .await
            .map_err(|e| AppError::generic(format!("Metadata read task failed: {}", e)))??;

        info!("Read metadata of float {}", float);
        Ok(FloatMetadata::from_dataset(&dataset))
    }

    async fn execute_data(&self, params: &QueryParams) -> Result<Dataset> {
        let float = FloatIdentity::from_params(params)?;
        let mode = FloatMode::from_params(params)?;
        let float_type = FloatTypeFilter::from_params(params)?;
        let descending = descending_cycles_from_params(params)?;
        let pattern = FileNamePattern::build(mode, &float_type, descending)?;

        let candidates = self
            .resolver
            .profile_directory_listing(self.transport.as_ref(), &float)
            .await?;
        let profiles = select_files(&pattern, &candidates);
        let metadata = self.resolver.metadata_locations(&float)?;
        info!(
            "Float {}: {} of {} profile files selected",
            float,
            profiles.len(),
            candidates.len()
        );

        let paths = self.materialize_data_files(&float, &profiles, &metadata).await?;

        let merger = DatasetMerger::new(Arc::clone(&self.reader));
        let dataset = tokio::task::spawn_blocking(move || merger.merge(&paths))
            .await
            .map_err(|e| AppError::generic(format!("Merge task failed: {}", e)))??;
        Ok(dataset)
    }

    /// Profiles under `.../profiles`, then the metadata file under the float directory
    async fn materialize_data_files(
        &self,
        float: &FloatIdentity,
        profiles: &[Url],
        metadata: &[Url],
    ) -> Result<Vec<PathBuf>> {
        let transport = self.transport.as_ref();
        let session = self.cache.acquire().await?;

        let mut paths = session
            .materialize_all(transport, profiles, &CachePath::profiles(float), true)
            .await?;
        paths.extend(
            session
                .materialize_all(transport, metadata, &CachePath::float(float), true)
                .await?,
        );
        Ok(paths)
    }
}
