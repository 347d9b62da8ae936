//! In-memory representation of a labeled multi-dimensional dataset

use ndarray::ArrayD;
use serde::Serialize;

use crate::errors::{FormatError, FormatResult};

/// Attribute attached to a dataset or a variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Named attribute
pub type Attribute = (String, AttributeValue);

/// Named dimension with its length
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

/// Typed variable data
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float(ArrayD<f64>),
    Int(ArrayD<i64>),
    /// Character arrays, one byte per cell
    Char(ArrayD<u8>),
}

impl Values {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Float(a) => a.shape(),
            Self::Int(a) => a.shape(),
            Self::Char(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Char(_) => "char",
        }
    }
}

/// One variable of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Dimension names, one per axis of `values`
    pub dimensions: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub values: Values,
}

impl Variable {
    /// Create a variable, checking that `dimensions` matches the data rank
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<String>,
        values: Values,
    ) -> FormatResult<Self> {
        let name = name.into();
        if dimensions.len() != values.ndim() {
            return Err(FormatError::ShapeMismatch {
                variable: name,
                expected: dimensions.len(),
                actual: values.ndim(),
            });
        }
        Ok(Self {
            name,
            dimensions,
            attributes: Vec::new(),
            values,
        })
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    /// Axis index of the named dimension
    pub fn axis_of(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == dimension)
    }
}

/// Attributes, dimensions and variables in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub attributes: Vec<Attribute>,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<Variable>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    /// Set an attribute, replacing any previous value
    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Add a variable, registering its dimensions from the data shape
    ///
    /// # Errors
    ///
    /// Returns `FormatError::ShapeMismatch` if a dimension is already known
    /// with a different length
    pub fn push_variable(&mut self, variable: Variable) -> FormatResult<()> {
        for (name, &len) in variable.dimensions.iter().zip(variable.values.shape()) {
            match self.dimension(name) {
                Some(known) if known.len != len => {
                    return Err(FormatError::ShapeMismatch {
                        variable: variable.name.clone(),
                        expected: known.len,
                        actual: len,
                    });
                }
                Some(_) => {}
                None => self.dimensions.push(Dimension {
                    name: name.clone(),
                    len,
                }),
            }
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Serializable outline of the dataset without the array data
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            attributes: self
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                .collect(),
            dimensions: self.dimensions.clone(),
            variables: self
                .variables
                .iter()
                .map(|v| VariableSummary {
                    name: v.name.clone(),
                    kind: v.values.kind(),
                    dimensions: v.dimensions.clone(),
                    shape: v.values.shape().to_vec(),
                })
                .collect(),
        }
    }
}

/// Outline of a dataset for reporting
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<VariableSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub kind: &'static str,
    pub dimensions: Vec<String>,
    pub shape: Vec<usize>,
}

impl From<&AttributeValue> for serde_json::Value {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Text(text) => serde_json::Value::String(text.clone()),
            AttributeValue::Number(n) => serde_json::json!(n),
            AttributeValue::Numbers(ns) => serde_json::json!(ns),
        }
    }
}
