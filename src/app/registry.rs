//! Named query descriptors
//!
//! The registry is shared by every broker: it lists all query names known to
//! the data access layer, including ones served elsewhere. A broker serves a
//! subset of it, which lets `execute` tell an unknown name from a known but
//! unsupported one.

use serde::Serialize;

use crate::constants::queries;

/// Value kind accepted for a query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Boolean,
    /// One string or a list of strings
    StringOrList,
}

/// Description of one query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::String,
            required: true,
            description,
        }
    }

    const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Static descriptor of a named query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedQueryInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

/// Every query name known to the data access layer
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    queries: Vec<NamedQueryInfo>,
}

impl QueryRegistry {
    /// Registry with the standard query set
    pub fn standard() -> Self {
        let float_params = || {
            vec![
                ParamSpec::required("dac", "Data assembly center code, e.g. aoml"),
                ParamSpec::required("float", "Float identifier, e.g. 1900722"),
            ]
        };

        let mut data_params = float_params();
        data_params.extend([
            ParamSpec::optional(
                "float_mode",
                ParamKind::String,
                "Processing mode: R (real-time), D (delayed) or A (adjusted); any if absent",
            ),
            ParamSpec::optional(
                "float_type",
                ParamKind::StringOrList,
                "File type: \"\" (core), B, M or S, or a list of them; any if absent",
            ),
            ParamSpec::optional(
                "descending_cycles",
                ParamKind::Boolean,
                "Include descending profiles (default true)",
            ),
        ]);

        Self {
            queries: vec![
                NamedQueryInfo {
                    name: queries::META,
                    description: "Metadata of an Argo float",
                    params: float_params(),
                },
                NamedQueryInfo {
                    name: queries::DATA,
                    description: "Profile data of an Argo float merged into one dataset",
                    params: data_params,
                },
                NamedQueryInfo {
                    name: queries::WOA23,
                    description: "World Ocean Atlas 2023 climatology",
                    params: Vec::new(),
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&NamedQueryInfo> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.queries.iter().map(|q| q.name)
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = QueryRegistry::standard();
        assert!(registry.contains(queries::META));
        assert!(registry.contains(queries::DATA));
        assert!(registry.contains(queries::WOA23));
        assert!(!registry.contains("urn:pokapok:udal:nothing"));
        assert_eq!(registry.names().count(), 3);
    }

    #[test]
    fn test_data_query_params() {
        let registry = QueryRegistry::standard();
        let data = registry.get(queries::DATA).unwrap();
        let names: Vec<&str> = data.params.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["dac", "float", "float_mode", "float_type", "descending_cycles"]
        );
        assert!(data.params.iter().filter(|p| p.required).count() == 2);
    }

    #[test]
    fn test_descriptor_serializes() {
        let registry = QueryRegistry::standard();
        let json = serde_json::to_value(registry.get(queries::META).unwrap()).unwrap();
        assert_eq!(json["name"], queries::META);
        assert_eq!(json["params"][0]["kind"], "string");
        assert_eq!(json["params"][1]["required"], true);
    }
}
