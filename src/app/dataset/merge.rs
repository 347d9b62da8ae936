//! Concatenation of per-profile datasets into one logical dataset
//!
//! Datasets are joined along the record dimension (`N_PROF`) in input order.
//! Non-record dimensions take the largest length seen, shorter variables are
//! padded with fill values. Variables that lack the record dimension are
//! taken from their first occurrence, and global attributes come from the
//! first dataset with missing keys filled from later ones. A file without
//! records (the float metadata file) may carry a per-float copy of a record
//! variable, e.g. `PLATFORM_NUMBER(STRING8)` next to the profiles'
//! `PLATFORM_NUMBER(N_PROF, STRING8)`; such copies are left out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{ArrayD, Axis, IxDyn, Slice};
use tracing::{debug, info};

use crate::constants::dataset;
use crate::errors::{FormatError, FormatResult};

use super::model::{Dataset, Dimension, Values, Variable};
use super::reader::DatasetReader;

/// Loads dataset files and concatenates them along the record dimension
#[derive(Clone)]
pub struct DatasetMerger {
    reader: Arc<dyn DatasetReader>,
    record_dimension: String,
}

impl std::fmt::Debug for DatasetMerger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetMerger")
            .field("record_dimension", &self.record_dimension)
            .finish_non_exhaustive()
    }
}

impl DatasetMerger {
    pub fn new(reader: Arc<dyn DatasetReader>) -> Self {
        Self {
            reader,
            record_dimension: dataset::RECORD_DIMENSION.to_string(),
        }
    }

    pub fn with_record_dimension(mut self, name: impl Into<String>) -> Self {
        self.record_dimension = name.into();
        self
    }

    pub fn record_dimension(&self) -> &str {
        &self.record_dimension
    }

    /// Open every path and merge the results, preserving order
    ///
    /// # Errors
    ///
    /// Returns `FormatError` naming the offending path if a file cannot be
    /// opened or its variables cannot be concatenated
    pub fn merge(&self, paths: &[PathBuf]) -> FormatResult<Dataset> {
        let mut parts = Vec::with_capacity(paths.len());
        for path in paths {
            let opened = self.reader.open(path)?;
            debug!(
                "Opened {} ({} variables)",
                path.display(),
                opened.variables.len()
            );
            parts.push((path.clone(), opened));
        }

        let merged = self.concat(&parts)?;
        info!(
            "Merged {} files into {} variables along {}",
            paths.len(),
            merged.variables.len(),
            self.record_dimension
        );
        Ok(merged)
    }

    /// Concatenate already opened datasets, each tagged with its source path
    pub fn concat(&self, parts: &[(PathBuf, Dataset)]) -> FormatResult<Dataset> {
        let mut merged = Dataset::new();

        for (_, part) in parts {
            for (key, value) in &part.attributes {
                if merged.attribute(key).is_none() {
                    merged.attributes.push((key.clone(), value.clone()));
                }
            }
        }

        merged.dimensions = self.merged_dimensions(parts);

        let mut names: Vec<&str> = Vec::new();
        for (_, part) in parts {
            for variable in &part.variables {
                if !names.contains(&variable.name.as_str()) {
                    names.push(&variable.name);
                }
            }
        }

        for name in names {
            let variable = self.merge_variable(name, parts, &merged.dimensions)?;
            merged.variables.push(variable);
        }

        Ok(merged)
    }

    fn record_len(&self, dataset: &Dataset) -> usize {
        dataset
            .dimension(&self.record_dimension)
            .map_or(0, |d| d.len)
    }

    fn merged_dimensions(&self, parts: &[(PathBuf, Dataset)]) -> Vec<Dimension> {
        let mut dimensions: Vec<Dimension> = Vec::new();
        for (_, part) in parts {
            for dim in &part.dimensions {
                let is_record = dim.name == self.record_dimension;
                match dimensions.iter_mut().find(|d| d.name == dim.name) {
                    Some(known) if is_record => known.len += dim.len,
                    Some(known) => known.len = known.len.max(dim.len),
                    None => dimensions.push(dim.clone()),
                }
            }
        }
        dimensions
    }

    fn merge_variable(
        &self,
        name: &str,
        parts: &[(PathBuf, Dataset)],
        dimensions: &[Dimension],
    ) -> FormatResult<Variable> {
        let occurrences: Vec<(&Path, &Variable)> = parts
            .iter()
            .filter_map(|(path, part)| part.variable(name).map(|v| (path.as_path(), v)))
            .collect();
        // A record copy wins over per-float copies of the same name
        let chosen = occurrences
            .iter()
            .find(|(_, v)| v.axis_of(&self.record_dimension).is_some())
            .or_else(|| occurrences.first());
        let Some(&(first_path, first)) = chosen else {
            return Err(FormatError::IncompatibleVariable {
                path: PathBuf::new(),
                variable: name.to_string(),
                reason: "variable not present in any dataset".to_string(),
            });
        };

        let target: Vec<usize> = first
            .dimensions
            .iter()
            .zip(first.values.shape())
            .map(|(dim, &len)| {
                dimensions
                    .iter()
                    .find(|d| &d.name == dim)
                    .map_or(len, |d| d.len)
            })
            .collect();

        let Some(axis) = first.axis_of(&self.record_dimension) else {
            let values = pad_values(&first.values, &target).map_err(|reason| {
                FormatError::IncompatibleVariable {
                    path: first_path.to_path_buf(),
                    variable: name.to_string(),
                    reason,
                }
            })?;
            return Ok(Variable {
                values,
                ..first.clone()
            });
        };

        let mut pieces = Vec::new();
        for (path, part) in parts {
            let rows = self.record_len(part);
            match part.variable(name) {
                Some(variable)
                    if rows == 0 && variable.axis_of(&self.record_dimension).is_none() =>
                {
                    debug!(
                        "Skipping per-float {} from {}",
                        name,
                        path.display()
                    );
                }
                Some(variable) => {
                    if variable.dimensions != first.dimensions {
                        return Err(FormatError::IncompatibleVariable {
                            path: path.clone(),
                            variable: name.to_string(),
                            reason: format!(
                                "dimensions {:?} differ from {:?} in {}",
                                variable.dimensions,
                                first.dimensions,
                                first_path.display()
                            ),
                        });
                    }
                    pieces.push(Piece::Present(path, &variable.values));
                }
                None if rows > 0 => pieces.push(Piece::Missing(rows)),
                None => {}
            }
        }

        let values = join_values(name, &first.values, &pieces, axis, &target)?;
        Ok(Variable {
            name: first.name.clone(),
            dimensions: first.dimensions.clone(),
            attributes: first.attributes.clone(),
            values,
        })
    }
}

/// One dataset's contribution to a record variable
enum Piece<'a> {
    Present(&'a Path, &'a Values),
    /// Dataset has records but not this variable
    Missing(usize),
}

fn join_values(
    name: &str,
    template: &Values,
    pieces: &[Piece<'_>],
    axis: usize,
    target: &[usize],
) -> FormatResult<Values> {
    Ok(match template {
        Values::Float(_) => Values::Float(join(name, pieces, axis, target, dataset::FLOAT_FILL, |v| {
            match v {
                Values::Float(a) => Some(a),
                _ => None,
            }
        })?),
        Values::Int(_) => Values::Int(join(name, pieces, axis, target, dataset::INT_FILL, |v| {
            match v {
                Values::Int(a) => Some(a),
                _ => None,
            }
        })?),
        Values::Char(_) => Values::Char(join(name, pieces, axis, target, dataset::CHAR_FILL, |v| {
            match v {
                Values::Char(a) => Some(a),
                _ => None,
            }
        })?),
    })
}

fn join<A, F>(
    name: &str,
    pieces: &[Piece<'_>],
    axis: usize,
    target: &[usize],
    fill: A,
    extract: F,
) -> FormatResult<ArrayD<A>>
where
    A: Clone,
    F: Fn(&Values) -> Option<&ArrayD<A>>,
{
    let mut blocks = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let mut shape = target.to_vec();
        match piece {
            Piece::Present(path, values) => {
                let array = extract(values).ok_or_else(|| FormatError::IncompatibleVariable {
                    path: path.to_path_buf(),
                    variable: name.to_string(),
                    reason: format!("element type {} differs", values.kind()),
                })?;
                shape[axis] = array.shape()[axis];
                blocks.push(pad(array, &shape, fill.clone()));
            }
            Piece::Missing(rows) => {
                shape[axis] = *rows;
                blocks.push(ArrayD::from_elem(IxDyn(&shape), fill.clone()));
            }
        }
    }

    if blocks.is_empty() {
        let mut shape = target.to_vec();
        shape[axis] = 0;
        return Ok(ArrayD::from_elem(IxDyn(&shape), fill));
    }

    let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
    ndarray::concatenate(Axis(axis), &views).map_err(|e| FormatError::IncompatibleVariable {
        path: PathBuf::new(),
        variable: name.to_string(),
        reason: e.to_string(),
    })
}

/// Grow `array` to `shape`, filling new cells with `fill`
fn pad<A: Clone>(array: &ArrayD<A>, shape: &[usize], fill: A) -> ArrayD<A> {
    if array.shape() == shape {
        return array.clone();
    }
    let mut out = ArrayD::from_elem(IxDyn(shape), fill);
    out.slice_each_axis_mut(|desc| Slice::from(0..array.shape()[desc.axis.index()]))
        .assign(array);
    out
}

fn pad_values(values: &Values, shape: &[usize]) -> Result<Values, String> {
    if values.shape().iter().zip(shape).any(|(have, want)| have > want) {
        return Err(format!(
            "shape {:?} exceeds merged dimensions {:?}",
            values.shape(),
            shape
        ));
    }
    Ok(match values {
        Values::Float(a) => Values::Float(pad(a, shape, dataset::FLOAT_FILL)),
        Values::Int(a) => Values::Int(pad(a, shape, dataset::INT_FILL)),
        Values::Char(a) => Values::Char(pad(a, shape, dataset::CHAR_FILL)),
    })
}
