//! # IFC Column Check
//!
//! Axial capacity control of structural columns read from IFC files.
//!
//! ## Features
//!
//! - Parse IFC files (IFC2x3 and IFC4 schemas)
//! - Select columns by building storey name or elevation
//! - Resolve material, concrete grade and cross-section per column
//! - Write a plain-text capacity report, with CSV and JSON exports
//! - Survey column heights and dimension labels
//!
//! ## Example
//!
//! ```no_run
//! use ifc_column_check::config::CheckConfig;
//! use ifc_column_check::geometry::SolidEvaluator;
//! use ifc_column_check::parser::load_model;
//! use ifc_column_check::report::{assemble, write_report_file};
//!
//! let config = CheckConfig::default();
//! let model = load_model(&config.model_path).expect("Failed to parse");
//! let scale = ifc_column_check::analysis::length_unit_scale(&model);
//! let report = assemble(&model, &config, &SolidEvaluator::new(&model, scale));
//! println!("Checked: {}", report.summary.total());
//! write_report_file(&report, &config.report_path).expect("Failed to write");
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod report;
pub mod survey;
