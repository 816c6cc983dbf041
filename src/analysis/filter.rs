//! Storey selection predicate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ELEVATION_TOLERANCE_M;
use crate::error::ConfigError;
use crate::model::Storey;

/// Raw filter value as written in a config file or on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Range([f64; 2]),
    Text(String),
}

/// Which storeys take part in the check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StoreyFilter {
    NameContains(String),
    NameEquals(String),
    /// Elevations in meters.
    ElevationLe(f64),
    ElevationGe(f64),
    ElevationBetween(f64, f64),
    /// A mode this tool does not know; matches nothing.
    Unrecognized { mode: String, value: String },
}

impl Default for StoreyFilter {
    fn default() -> Self {
        StoreyFilter::NameContains("-1".to_string())
    }
}

impl StoreyFilter {
    /// Builds a filter from a mode name and its value.
    ///
    /// Mode names are case-insensitive. Unknown modes produce
    /// [`StoreyFilter::Unrecognized`]; a value that does not fit a known
    /// mode is an error.
    pub fn from_mode(mode: &str, value: &FilterValue) -> Result<Self, ConfigError> {
        let mode_lower = mode.trim().to_lowercase();
        let bad_value = || ConfigError::FilterValue {
            mode: mode.to_string(),
            value: value.to_string(),
        };

        let filter = match mode_lower.as_str() {
            "name_contains" => StoreyFilter::NameContains(value.to_string()),
            "name_equals" => StoreyFilter::NameEquals(value.to_string()),
            "elevation_le" => StoreyFilter::ElevationLe(value.as_number().ok_or_else(bad_value)?),
            "elevation_ge" => StoreyFilter::ElevationGe(value.as_number().ok_or_else(bad_value)?),
            "elevation_between" => {
                let [low, high] = value.as_range().ok_or_else(bad_value)?;
                StoreyFilter::ElevationBetween(low, high)
            }
            _ => {
                tracing::warn!(mode, "Unrecognized storey filter mode, no storey will match");
                StoreyFilter::Unrecognized {
                    mode: mode.to_string(),
                    value: value.to_string(),
                }
            }
        };
        Ok(filter)
    }

    #[must_use]
    pub fn mode(&self) -> &str {
        match self {
            StoreyFilter::NameContains(_) => "name_contains",
            StoreyFilter::NameEquals(_) => "name_equals",
            StoreyFilter::ElevationLe(_) => "elevation_le",
            StoreyFilter::ElevationGe(_) => "elevation_ge",
            StoreyFilter::ElevationBetween(..) => "elevation_between",
            StoreyFilter::Unrecognized { mode, .. } => mode,
        }
    }

    /// Evaluates the filter; `unit_scale` converts the storey elevation to
    /// meters. Elevation modes fail closed when the storey has no elevation.
    #[must_use]
    pub fn matches(&self, storey: &Storey, unit_scale: f64) -> bool {
        let name = storey.name.as_deref().unwrap_or("").trim();
        let long_name = storey.long_name.as_deref().unwrap_or("").trim();
        let elevation_m = storey.elevation.map(|e| e * unit_scale);

        match self {
            StoreyFilter::NameContains(needle) => format!("{name} {long_name}")
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            StoreyFilter::NameEquals(needle) => {
                let needle = needle.to_lowercase();
                name.to_lowercase() == needle || long_name.to_lowercase() == needle
            }
            StoreyFilter::ElevationLe(limit) => {
                elevation_m.is_some_and(|e| e <= limit + ELEVATION_TOLERANCE_M)
            }
            StoreyFilter::ElevationGe(limit) => {
                elevation_m.is_some_and(|e| e >= limit - ELEVATION_TOLERANCE_M)
            }
            StoreyFilter::ElevationBetween(low, high) => elevation_m.is_some_and(|e| {
                (low - ELEVATION_TOLERANCE_M..=high + ELEVATION_TOLERANCE_M).contains(&e)
            }),
            StoreyFilter::Unrecognized { .. } => false,
        }
    }
}

/// Renders the filter value the way it appears in the report header.
impl fmt::Display for StoreyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreyFilter::NameContains(v) | StoreyFilter::NameEquals(v) => write!(f, "{v}"),
            StoreyFilter::ElevationLe(v) | StoreyFilter::ElevationGe(v) => write!(f, "{v:?}"),
            StoreyFilter::ElevationBetween(low, high) => write!(f, "({low:?}, {high:?})"),
            StoreyFilter::Unrecognized { value, .. } => write!(f, "{value}"),
        }
    }
}

impl FilterValue {
    /// Parses a command-line value: `"-3,0"` or `"(-3.0, 0.0)"` is a range,
    /// a plain number is a number, anything else is text.
    #[must_use]
    pub fn parse_cli(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            return FilterValue::Number(n);
        }
        let inner = trimmed.trim_start_matches('(').trim_end_matches(')');
        if let Some((low, high)) = inner.split_once(',') {
            if let (Ok(low), Ok(high)) = (low.trim().parse(), high.trim().parse()) {
                return FilterValue::Range([low, high]);
            }
        }
        FilterValue::Text(raw.to_string())
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(t) => t.trim().parse().ok(),
            FilterValue::Range(_) => None,
        }
    }

    fn as_range(&self) -> Option<[f64; 2]> {
        match self {
            FilterValue::Range(r) => Some(*r),
            FilterValue::Text(t) => match FilterValue::parse_cli(t) {
                FilterValue::Range(r) => Some(r),
                _ => None,
            },
            FilterValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{n}"),
            FilterValue::Range([low, high]) => write!(f, "({low:?}, {high:?})"),
            FilterValue::Text(t) => write!(f, "{t}"),
        }
    }
}
