//! Scientific dataset model, file readers and merging
//!
//! - [`model`] - In-memory dataset with typed `ndarray` variables
//! - [`reader`] - The [`DatasetReader`] seam and the NetCDF implementation
//! - [`merge`] - Concatenation of profile files along `N_PROF`
//! - [`metadata`] - Float metadata record

pub mod merge;
pub mod metadata;
pub mod model;
pub mod reader;

pub use merge::DatasetMerger;
pub use metadata::FloatMetadata;
pub use model::{AttributeValue, Dataset, DatasetSummary, Dimension, Values, Variable};
pub use reader::{default_reader, DatasetReader, UnavailableReader};

#[cfg(feature = "netcdf")]
pub use reader::NetcdfReader;
