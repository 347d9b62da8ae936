//! Data models for Argo float queries
//!
//! This module holds the value types a query is built from: the archive the
//! broker is bound to, the float being asked about, and the semantic filters
//! that select profile files.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::constants::{archive, files};
use crate::errors::{ConfigError, ConfigResult, ValidationError, ValidationResult};

/// String-keyed query parameters as passed to `execute`
pub type QueryParams = serde_json::Map<String, Value>;

/// One of the known remote Argo archives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocation {
    base: String,
}

impl ArchiveLocation {
    /// Bind to `url` if it is one of the known archives
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedArchive` for any other address
    pub fn parse(url: &str) -> ConfigResult<Self> {
        if !archive::KNOWN_ARCHIVES.contains(&url) {
            return Err(ConfigError::UnsupportedArchive {
                url: url.to_string(),
            });
        }
        Ok(Self {
            base: url.trim_end_matches('/').to_string(),
        })
    }

    /// Base address without trailing separator
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Directory of a float: `<archive>/dac/<dac>/<float>/`
    pub fn float_dir(&self, float: &FloatIdentity) -> String {
        format!(
            "{}/{}/{}/{}/",
            self.base,
            archive::DAC_SEGMENT,
            float.dac(),
            float.float()
        )
    }

    /// Profile listing of a float: `<archive>/dac/<dac>/<float>/profiles/`
    pub fn profiles_dir(&self, float: &FloatIdentity) -> String {
        format!("{}{}/", self.float_dir(float), archive::PROFILES_SEGMENT)
    }

    /// Metadata file of a float: `<archive>/dac/<dac>/<float>/<float>_meta.nc`
    pub fn metadata_file(&self, float: &FloatIdentity) -> String {
        format!(
            "{}{}{}.{}",
            self.float_dir(float),
            float.float(),
            files::META_FILE_SUFFIX,
            files::NETCDF_EXTENSION
        )
    }
}

impl fmt::Display for ArchiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Data assembly center and float identifier pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatIdentity {
    dac: String,
    float: String,
}

impl FloatIdentity {
    /// Create a float identity, rejecting values that would escape their path segment
    pub fn new(dac: impl Into<String>, float: impl Into<String>) -> ValidationResult<Self> {
        let dac = dac.into();
        let float = float.into();
        validate_segment("dac", &dac)?;
        validate_segment("float", &float)?;
        Ok(Self { dac, float })
    }

    /// Read `dac` and `float` from query parameters
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` naming the first absent field
    pub fn from_params(params: &QueryParams) -> ValidationResult<Self> {
        let dac = required_str(params, "dac")?;
        let float = required_str(params, "float")?;
        Self::new(dac, float)
    }

    pub fn dac(&self) -> &str {
        &self.dac
    }

    pub fn float(&self) -> &str {
        &self.float
    }
}

impl fmt::Display for FloatIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dac, self.float)
    }
}

fn validate_segment(field: &str, value: &str) -> ValidationResult<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.contains('/') || value.contains('\\') {
        Some("must not contain path separators")
    } else if value == "." || value == ".." {
        Some("must not be a relative path component")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn required_str(params: &QueryParams, field: &str) -> ValidationResult<String> {
    match params.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField {
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: other.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}

/// Processing stage of a profile file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatMode {
    /// Real-time data
    RealTime,
    /// Delayed-mode, scientifically quality controlled data
    Delayed,
    /// Real-time data with adjusted values
    Adjusted,
}

impl FloatMode {
    /// Every defined processing mode
    pub const ALL: [FloatMode; 3] = [FloatMode::RealTime, FloatMode::Delayed, FloatMode::Adjusted];

    /// Code used in profile file names
    pub fn code(&self) -> &'static str {
        match self {
            FloatMode::RealTime => "R",
            FloatMode::Delayed => "D",
            FloatMode::Adjusted => "A",
        }
    }

    /// Parse a file name code or a spelled-out mode name
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "r" | "real-time" | "realtime" => Some(FloatMode::RealTime),
            "d" | "delayed" => Some(FloatMode::Delayed),
            "a" | "adjusted" => Some(FloatMode::Adjusted),
            _ => None,
        }
    }

    /// Read the optional `float_mode` parameter
    pub fn from_params(params: &QueryParams) -> ValidationResult<Option<Self>> {
        match params.get("float_mode") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Self::parse(s).map(Some).ok_or_else(|| {
                ValidationError::InvalidValue {
                    field: "float_mode".to_string(),
                    value: s.clone(),
                    reason: "expected one of R, D, A".to_string(),
                }
            }),
            Some(other) => Err(ValidationError::InvalidValue {
                field: "float_mode".to_string(),
                value: other.to_string(),
                reason: "expected a string".to_string(),
            }),
        }
    }
}

/// Kind of profile file, encoded as a file name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatType {
    /// Core profile file, no prefix
    Core,
    /// Biogeochemical profile file
    Bgc,
    /// Merged core and BGC profile file
    Merged,
    /// Synthetic profile file
    Synthetic,
}

impl FloatType {
    /// Every defined file type
    pub const ALL: [FloatType; 4] = [
        FloatType::Core,
        FloatType::Bgc,
        FloatType::Merged,
        FloatType::Synthetic,
    ];

    /// Prefix used in profile file names
    pub fn code(&self) -> &'static str {
        match self {
            FloatType::Core => "",
            FloatType::Bgc => "B",
            FloatType::Merged => "M",
            FloatType::Synthetic => "S",
        }
    }

    /// Parse a file name prefix or a spelled-out type name
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "" | "core" => Some(FloatType::Core),
            "b" | "bgc" => Some(FloatType::Bgc),
            "m" | "merged" => Some(FloatType::Merged),
            "s" | "synthetic" => Some(FloatType::Synthetic),
            _ => None,
        }
    }
}

/// Float type selection: any type, one type, or a list of types
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FloatTypeFilter {
    #[default]
    Any,
    One(FloatType),
    Many(Vec<FloatType>),
}

impl FloatTypeFilter {
    /// Read the optional `float_type` parameter (a string or a list of strings)
    pub fn from_params(params: &QueryParams) -> ValidationResult<Self> {
        let parse_one = |value: &Value| -> ValidationResult<FloatType> {
            value
                .as_str()
                .and_then(FloatType::parse)
                .ok_or_else(|| ValidationError::InvalidValue {
                    field: "float_type".to_string(),
                    value: value.to_string(),
                    reason: "expected one of \"\", B, M, S".to_string(),
                })
        };

        match params.get("float_type") {
            None | Some(Value::Null) => Ok(FloatTypeFilter::Any),
            Some(Value::Array(values)) => {
                let types = values.iter().map(parse_one).collect::<Result<Vec<_>, _>>()?;
                Ok(FloatTypeFilter::Many(types))
            }
            Some(value) => parse_one(value).map(FloatTypeFilter::One),
        }
    }
}

/// Read the optional `descending_cycles` flag, defaulting to `true`
pub fn descending_cycles_from_params(params: &QueryParams) -> ValidationResult<bool> {
    match params.get("descending_cycles") {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(other) => Err(ValidationError::InvalidValue {
            field: "descending_cycles".to_string(),
            value: other.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Name of the last path segment of a URL
pub fn url_file_name(url: &Url) -> Option<&str> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
}
