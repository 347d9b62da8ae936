//! Dataset file readers
//!
//! Reading NetCDF needs the system netcdf library, so the native reader is
//! only compiled with the `netcdf` cargo feature. Builds without it use
//! [`UnavailableReader`], which fails every open with a clear error.

use std::path::Path;
use std::sync::Arc;

use crate::errors::{FormatError, FormatResult};

use super::model::Dataset;

/// Opens a local dataset file into memory
pub trait DatasetReader: Send + Sync {
    fn open(&self, path: &Path) -> FormatResult<Dataset>;
}

/// Reader used when no file format support is compiled in
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableReader;

impl DatasetReader for UnavailableReader {
    fn open(&self, path: &Path) -> FormatResult<Dataset> {
        Err(FormatError::ReaderUnavailable {
            path: path.to_path_buf(),
        })
    }
}

/// Best reader available in this build
pub fn default_reader() -> Arc<dyn DatasetReader> {
    #[cfg(feature = "netcdf")]
    {
        Arc::new(netcdf_reader::NetcdfReader)
    }
    #[cfg(not(feature = "netcdf"))]
    {
        Arc::new(UnavailableReader)
    }
}

#[cfg(feature = "netcdf")]
pub use netcdf_reader::NetcdfReader;

#[cfg(feature = "netcdf")]
mod netcdf_reader {
    use std::path::Path;

    use ndarray::{ArrayD, IxDyn};
    use netcdf::types::NcVariableType;
    use tracing::{debug, warn};

    use super::DatasetReader;
    use crate::app::dataset::model::{AttributeValue, Dataset, Dimension, Values, Variable};
    use crate::errors::{FormatError, FormatResult};

    /// Native NetCDF reader backed by libnetcdf
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NetcdfReader;

    impl DatasetReader for NetcdfReader {
        fn open(&self, path: &Path) -> FormatResult<Dataset> {
            let open_error = |reason: String| FormatError::Open {
                path: path.to_path_buf(),
                reason,
            };

            let file = netcdf::open(path).map_err(|e| open_error(e.to_string()))?;

            let mut dataset = Dataset::new();
            for attr in file.attributes() {
                if let Some(value) = attr.value().ok().and_then(convert_attribute) {
                    dataset.attributes.push((attr.name().to_string(), value));
                }
            }

            dataset.dimensions = file
                .dimensions()
                .map(|d| Dimension {
                    name: d.name(),
                    len: d.len(),
                })
                .collect();

            for var in file.variables() {
                let name = var.name();
                let dimensions: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
                let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

                let values = match var.vartype() {
                    NcVariableType::Float(_) => {
                        let data: Vec<f64> = var
                            .get_values(..)
                            .map_err(|e| open_error(format!("reading {}: {}", name, e)))?;
                        Values::Float(shaped(&name, &shape, data)?)
                    }
                    NcVariableType::Int(_) => {
                        let data: Vec<i64> = var
                            .get_values(..)
                            .map_err(|e| open_error(format!("reading {}: {}", name, e)))?;
                        Values::Int(shaped(&name, &shape, data)?)
                    }
                    NcVariableType::Char => {
                        let data = var
                            .get_raw_values(..)
                            .map_err(|e| open_error(format!("reading {}: {}", name, e)))?;
                        Values::Char(shaped(&name, &shape, data)?)
                    }
                    other => {
                        warn!("Skipping {} in {}: unsupported type {:?}", name, path.display(), other);
                        continue;
                    }
                };

                let mut variable = Variable::new(name, dimensions, values)?;
                for attr in var.attributes() {
                    if let Some(value) = attr.value().ok().and_then(convert_attribute) {
                        variable.attributes.push((attr.name().to_string(), value));
                    }
                }
                dataset.variables.push(variable);
            }

            debug!(
                "Read {} ({} dimensions, {} variables)",
                path.display(),
                dataset.dimensions.len(),
                dataset.variables.len()
            );
            Ok(dataset)
        }
    }

    fn shaped<A>(name: &str, shape: &[usize], data: Vec<A>) -> FormatResult<ArrayD<A>> {
        let expected: usize = shape.iter().product();
        let actual = data.len();
        ArrayD::from_shape_vec(IxDyn(shape), data).map_err(|_| FormatError::ShapeMismatch {
            variable: name.to_string(),
            expected,
            actual,
        })
    }

    fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttributeValue> {
        match value {
            netcdf::AttributeValue::Str(text) => Some(AttributeValue::Text(text)),
            netcdf::AttributeValue::Strs(texts) => Some(AttributeValue::Text(texts.join("\n"))),
            netcdf::AttributeValue::Doubles(values) => Some(AttributeValue::Numbers(values)),
            netcdf::AttributeValue::Floats(values) => Some(AttributeValue::Numbers(
                values.into_iter().map(f64::from).collect(),
            )),
            netcdf::AttributeValue::Ints(values) => Some(AttributeValue::Numbers(
                values.into_iter().map(f64::from).collect(),
            )),
            other => f64::try_from(other).ok().map(AttributeValue::Number),
        }
    }
}
