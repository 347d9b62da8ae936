//! Float metadata record extracted from a `<float>_meta.nc` dataset

use serde::Serialize;

use super::model::{AttributeValue, Dataset};

/// Flat description of a float's metadata file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatMetadata {
    pub institution: Option<String>,
    pub title: Option<String>,
    pub source: Option<String>,
    pub references: Option<String>,
    /// Dimension names in file order
    pub dimensions: Vec<String>,
    /// Variable names in file order
    pub variables: Vec<String>,
}

impl FloatMetadata {
    /// Extract the record; absent attributes are `None`
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let text = |name: &str| {
            dataset.attribute(name).map(|value| match value {
                AttributeValue::Text(text) => text.clone(),
                other => serde_json::Value::from(other).to_string(),
            })
        };

        Self {
            institution: text("institution"),
            title: text("title"),
            source: text("source"),
            references: text("references"),
            dimensions: dataset.dimension_names(),
            variables: dataset.variable_names(),
        }
    }
}
