//! Run configuration for the capacity check.
//!
//! Values come from built-in defaults, optionally overridden by a JSON file
//! and then by command-line flags. The resulting [`CheckConfig`] is
//! immutable and passed into the pipeline.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::filter::{FilterValue, StoreyFilter};
use crate::error::ConfigError;
use crate::export::JsonLayout;

/// Plan dimensions above this (meters) are treated as a profile/geometry
/// mismatch and replaced by the bounding box.
pub const PLAUSIBLE_EDGE_M: f64 = 5.0;

/// Tolerance (meters) for storey elevation comparisons.
pub const ELEVATION_TOLERANCE_M: f64 = 0.01;

pub const DEFAULT_REPORT_PATH: &str = "Capacity.control.report.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct CheckConfig {
    pub model_path: PathBuf,
    pub report_path: PathBuf,
    /// Design axial load Ned in kN.
    pub demand_load_kn: f64,
    /// Material safety factor.
    pub gamma_m: f64,
    /// Characteristic strength in N/mm² used when nothing else is found.
    pub default_strength: f64,
    pub storey_filter: StoreyFilter,
    pub json_layout: JsonLayout,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.ifc"),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            demand_load_kn: 882.78,
            gamma_m: 1.45,
            default_strength: 35.0,
            storey_filter: StoreyFilter::default(),
            json_layout: JsonLayout::Pretty,
        }
    }
}

/// Shape of the JSON config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model_path: Option<PathBuf>,
    pub report_path: Option<PathBuf>,
    pub demand_load_kn: Option<f64>,
    pub gamma_m: Option<f64>,
    pub default_strength: Option<f64>,
    pub storey_filter: Option<FilterSpec>,
    pub json_layout: Option<JsonLayout>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterSpec {
    pub mode: String,
    pub value: FilterValue,
}

impl ConfigFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::FileRead {
            path: path_ref.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path_ref.to_path_buf(),
            source,
        })
    }
}

impl CheckConfig {
    /// Applies the fields present in a config file on top of `self`.
    pub fn merge_file(mut self, file: ConfigFile) -> Result<Self, ConfigError> {
        if let Some(path) = file.model_path {
            self.model_path = path;
        }
        if let Some(path) = file.report_path {
            self.report_path = path;
        }
        if let Some(load) = file.demand_load_kn {
            self.demand_load_kn = load;
        }
        if let Some(gamma) = file.gamma_m {
            self.gamma_m = gamma;
        }
        if let Some(strength) = file.default_strength {
            self.default_strength = strength;
        }
        if let Some(spec) = file.storey_filter {
            self.storey_filter = StoreyFilter::from_mode(&spec.mode, &spec.value)?;
        }
        if let Some(layout) = file.json_layout {
            self.json_layout = layout;
        }
        Ok(self)
    }
}
