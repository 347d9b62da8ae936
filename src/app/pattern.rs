//! File name pattern construction
//!
//! Profile files in an Argo `profiles/` directory are named
//! `<type><mode><float>_<cycle>[D].nc`. A [`FileNamePattern`] is derived from
//! the semantic filters of a data query and accepts exactly the file names
//! those filters describe.

use regex::Regex;
use url::Url;

use crate::app::models::{FloatMode, FloatType, FloatTypeFilter};
use crate::constants::files;
use crate::errors::{ConfigError, ConfigResult};

/// Build a regular expression group matching exactly one of `values`
///
/// Values are matched literally. An empty value in `values` makes the whole
/// group optional instead of adding an empty branch. Returns an empty string
/// when the only value is the empty one.
pub fn enum_alternation<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut optional = false;
    let mut branches: Vec<String> = Vec::new();
    for value in values {
        if value.is_empty() {
            optional = true;
        } else {
            let escaped = regex::escape(value);
            if !branches.contains(&escaped) {
                branches.push(escaped);
            }
        }
    }

    if branches.is_empty() {
        return String::new();
    }
    let group = format!("(?:{})", branches.join("|"));
    if optional {
        format!("{}?", group)
    } else {
        group
    }
}

/// Compiled matching rule for profile file URLs
#[derive(Debug, Clone)]
pub struct FileNamePattern {
    regex: Regex,
}

impl FileNamePattern {
    /// Build the rule for the given filters
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidFloatType` for an empty type list
    pub fn build(
        mode: Option<FloatMode>,
        float_type: &FloatTypeFilter,
        include_descending: bool,
    ) -> ConfigResult<Self> {
        let source = Self::source(mode, float_type, include_descending)?;
        let regex = Regex::new(&source).map_err(|source_err| ConfigError::InvalidPattern {
            pattern: source.clone(),
            source: source_err,
        })?;
        Ok(Self { regex })
    }

    /// Regular expression text for the given filters
    pub fn source(
        mode: Option<FloatMode>,
        float_type: &FloatTypeFilter,
        include_descending: bool,
    ) -> ConfigResult<String> {
        let mode = match mode {
            Some(mode) => regex::escape(mode.code()),
            None => enum_alternation(FloatMode::ALL.iter().map(FloatMode::code)),
        };

        let float_type = match float_type {
            FloatTypeFilter::Any => enum_alternation(FloatType::ALL.iter().map(FloatType::code)),
            FloatTypeFilter::One(t) => regex::escape(t.code()),
            FloatTypeFilter::Many(types) => match types.as_slice() {
                [] => {
                    return Err(ConfigError::InvalidFloatType {
                        reason: "empty float type list".to_string(),
                    })
                }
                [single] => regex::escape(single.code()),
                _ => enum_alternation(types.iter().map(FloatType::code)),
            },
        };

        let descending = if include_descending {
            format!("{}?", regex::escape(files::DESCENDING_MARKER))
        } else {
            String::new()
        };

        Ok(format!(
            r"^.*/{}{}[0-9]+_[0-9]+{}\.{}$",
            float_type,
            mode,
            descending,
            regex::escape(files::NETCDF_EXTENSION)
        ))
    }

    /// Regular expression text of this rule
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the URL's last path segment is an accepted file name
    pub fn matches(&self, url: &Url) -> bool {
        self.regex.is_match(url.as_str())
    }

    /// Whether a full URL string is accepted
    pub fn matches_str(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/";

    fn name(float_type: FloatType, mode: FloatMode, descending: bool) -> String {
        format!(
            "{}{}{}1900722_001{}.nc",
            BASE,
            float_type.code(),
            mode.code(),
            if descending { "D" } else { "" }
        )
    }

    #[test]
    fn test_enum_alternation_exhaustive() {
        let group = enum_alternation(FloatMode::ALL.iter().map(FloatMode::code));
        assert_eq!(group, "(?:R|D|A)");

        let re = Regex::new(&format!("^{}$", group)).unwrap();
        for mode in FloatMode::ALL {
            assert!(re.is_match(mode.code()));
        }
        assert!(!re.is_match(""));
        assert!(!re.is_match("X"));
    }

    #[test]
    fn test_enum_alternation_with_empty_member_is_optional() {
        let group = enum_alternation(FloatType::ALL.iter().map(FloatType::code));
        assert_eq!(group, "(?:B|M|S)?");

        let re = Regex::new(&format!("^{}$", group)).unwrap();
        for t in FloatType::ALL {
            assert!(re.is_match(t.code()));
        }
        assert!(!re.is_match("Q"));
    }

    #[test]
    fn test_enum_alternation_only_empty() {
        assert_eq!(enum_alternation([""]), "");
    }

    #[test]
    fn test_pattern_is_pure() {
        let a = FileNamePattern::source(Some(FloatMode::Delayed), &FloatTypeFilter::Any, true);
        let b = FileNamePattern::source(Some(FloatMode::Delayed), &FloatTypeFilter::Any, true);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_every_combination_matches_its_own_names() {
        for t in FloatType::ALL {
            for mode in FloatMode::ALL {
                for descending in [false, true] {
                    let pattern =
                        FileNamePattern::build(Some(mode), &FloatTypeFilter::One(t), descending)
                            .unwrap();
                    assert!(pattern.matches_str(&name(t, mode, false)));
                    assert_eq!(pattern.matches_str(&name(t, mode, true)), descending);
                }
            }
        }
    }

    #[test]
    fn test_rejects_other_modes_and_types() {
        let pattern = FileNamePattern::build(
            Some(FloatMode::RealTime),
            &FloatTypeFilter::One(FloatType::Bgc),
            true,
        )
        .unwrap();

        assert!(pattern.matches_str(&name(FloatType::Bgc, FloatMode::RealTime, false)));
        assert!(!pattern.matches_str(&name(FloatType::Bgc, FloatMode::Delayed, false)));
        assert!(!pattern.matches_str(&name(FloatType::Core, FloatMode::RealTime, false)));
        assert!(!pattern.matches_str(&name(FloatType::Synthetic, FloatMode::RealTime, false)));
    }

    #[test]
    fn test_core_type_does_not_match_prefixed_files() {
        let pattern =
            FileNamePattern::build(None, &FloatTypeFilter::One(FloatType::Core), true).unwrap();
        assert!(pattern.matches_str(&name(FloatType::Core, FloatMode::Delayed, false)));
        assert!(!pattern.matches_str(&name(FloatType::Bgc, FloatMode::Delayed, false)));
        assert!(!pattern.matches_str(&name(FloatType::Merged, FloatMode::RealTime, false)));
    }

    #[test]
    fn test_absent_filters_match_all_defined_values_only() {
        let pattern = FileNamePattern::build(None, &FloatTypeFilter::Any, false).unwrap();
        for t in FloatType::ALL {
            for mode in FloatMode::ALL {
                assert!(pattern.matches_str(&name(t, mode, false)));
            }
        }
        assert!(!pattern.matches_str(&format!("{}X1900722_001.nc", BASE)));
        assert!(!pattern.matches_str(&format!("{}QR1900722_001.nc", BASE)));
    }

    #[test]
    fn test_type_list() {
        let many = FloatTypeFilter::Many(vec![FloatType::Bgc, FloatType::Synthetic]);
        let pattern = FileNamePattern::build(Some(FloatMode::Delayed), &many, false).unwrap();
        assert!(pattern.matches_str(&name(FloatType::Bgc, FloatMode::Delayed, false)));
        assert!(pattern.matches_str(&name(FloatType::Synthetic, FloatMode::Delayed, false)));
        assert!(!pattern.matches_str(&name(FloatType::Merged, FloatMode::Delayed, false)));
        assert!(!pattern.matches_str(&name(FloatType::Core, FloatMode::Delayed, false)));

        let single = FloatTypeFilter::Many(vec![FloatType::Merged]);
        assert_eq!(
            FileNamePattern::source(Some(FloatMode::Delayed), &single, false).unwrap(),
            FileNamePattern::source(
                Some(FloatMode::Delayed),
                &FloatTypeFilter::One(FloatType::Merged),
                false
            )
            .unwrap()
        );
    }

    #[test]
    fn test_empty_type_list_is_config_error() {
        let result = FileNamePattern::build(None, &FloatTypeFilter::Many(vec![]), true);
        assert!(matches!(result, Err(ConfigError::InvalidFloatType { .. })));
    }

    #[test]
    fn test_file_name_must_be_last_segment() {
        let pattern = FileNamePattern::build(None, &FloatTypeFilter::Any, true).unwrap();
        assert!(!pattern.matches_str(&format!("{}R1900722_001.nc/extra", BASE)));
        assert!(!pattern.matches_str(&format!("{}R1900722_001.nc.bak", BASE)));
        assert!(!pattern.matches_str("R1900722_001.nc"));
        assert!(!pattern.matches_str(&format!("{}1900722_meta.nc", BASE)));
    }
}
