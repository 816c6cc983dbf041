//! Error types for the column capacity checker.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading IFC files.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the IFC file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The STEP format is invalid or malformed.
    #[error("invalid STEP format: {message}")]
    InvalidStep { message: String },
}

/// Errors that can occur when building the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this tool.
    #[error("invalid config '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A storey filter value does not fit the selected mode.
    #[error("storey filter mode '{mode}' does not accept value '{value}'")]
    FilterValue { mode: String, value: String },
}

/// Errors raised while evaluating the shape of a single element.
///
/// These never abort a run; callers treat them as "no result from this
/// source" and move on to the next fallback.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The element has no usable body representation.
    #[error("entity #{id} has no shape representation")]
    NoRepresentation { id: u64 },

    /// A referenced entity is missing or has an unexpected type.
    #[error("entity #{id}: {message}")]
    Malformed { id: u64, message: String },

    /// Evaluation produced no vertices.
    #[error("entity #{id} produced no vertices")]
    Empty { id: u64 },
}

/// Errors that can occur when writing the capacity report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to create the report file.
    #[error("failed to create report '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write to the report sink.
    #[error("failed to write report: {source}")]
    Write {
        #[from]
        source: std::io::Error,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}
