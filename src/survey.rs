//! Name-based column surveys: heights grouped by family and dimension
//! label, and plain inventory counts.

use std::collections::BTreeMap;
use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analysis::material::{classify_family, UNKNOWN_FAMILY};
use crate::analysis::design_resistance_kn;
use crate::error::ReportError;
use crate::geometry::ShapeEvaluator;
use crate::model::{Column, IfcModel};

/// Label used when a column name carries no `:` segment.
pub const UNKNOWN_DIMENSION: &str = "UNKNOWN";

/// Default tolerance (meters) for "base at z = 0".
pub const BASE_TOLERANCE_M: f64 = 0.002;

static DIMENSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[x×]\s*(\d+(?:\.\d+)?)\s*(mm|cm|m)?")
        .expect("dimension pattern is valid")
});

/// Rectangular area in m² from a label such as `400 x 400mm`, `40×40 cm` or
/// `0.4x0.4 m`. Millimeters when no unit is given.
#[must_use]
pub fn parse_dimension_text(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let caps = DIMENSION_PATTERN.captures(&lower)?;
    let b: f64 = caps.get(1)?.as_str().parse().ok()?;
    let h: f64 = caps.get(2)?.as_str().parse().ok()?;
    let scale = match caps.get(3).map(|m| m.as_str()) {
        Some("m") => 1.0,
        Some("cm") => 1e-2,
        _ => 1e-3,
    };
    Some(b * scale * h * scale)
}

/// Family derived from the column name alone.
fn name_family(column: &Column) -> &'static str {
    classify_family(&[column.name.as_str()])
}

fn dimension_key(column: &Column) -> String {
    column
        .dimension_label()
        .unwrap_or(UNKNOWN_DIMENSION)
        .to_string()
}

/// family → dimension label → rounded height (mm) → count
#[derive(Debug, Default, Serialize)]
pub struct HeightSurvey {
    pub base_tolerance_m: Option<f64>,
    pub families: BTreeMap<String, BTreeMap<String, BTreeMap<i64, usize>>>,
}

impl HeightSurvey {
    /// Number of surveyed columns with a given label.
    #[must_use]
    pub fn count(&self, family: &str, dimension: &str) -> usize {
        self.families
            .get(family)
            .and_then(|dims| dims.get(dimension))
            .map_or(0, |heights| heights.values().sum())
    }
}

/// Vertical extent of every named column, rounded to millimeters.
///
/// Columns whose name does not classify, or whose shape cannot be
/// evaluated, are skipped. With `base_tolerance_m`, only columns whose
/// lowest vertex lies within that distance of z = 0 are kept.
#[must_use]
pub fn survey_heights(
    model: &IfcModel,
    evaluator: &dyn ShapeEvaluator,
    base_tolerance_m: Option<f64>,
) -> HeightSurvey {
    let mut survey = HeightSurvey {
        base_tolerance_m,
        ..HeightSurvey::default()
    };

    for column in model.columns() {
        let family = name_family(&column);
        if family == UNKNOWN_FAMILY {
            continue;
        }
        let bounds = match evaluator.bounds(column.id) {
            Ok(bounds) => bounds,
            Err(err) => {
                tracing::debug!(column = column.id, error = %err, "No geometry for height");
                continue;
            }
        };
        if let Some(tolerance) = base_tolerance_m {
            if bounds.min.z.abs() > tolerance {
                continue;
            }
        }

        let height_mm = (bounds.extent_z() * 1000.0).round() as i64;
        *survey
            .families
            .entry(family.to_string())
            .or_default()
            .entry(dimension_key(&column))
            .or_default()
            .entry(height_mm)
            .or_default() += 1;
    }

    survey
}

/// Writes the height survey, followed by nominal capacities for every label
/// that parses as a rectangle.
pub fn render_heights<W: Write>(
    survey: &HeightSurvey,
    strength: f64,
    gamma_m: f64,
    out: &mut W,
) -> Result<(), ReportError> {
    match survey.base_tolerance_m {
        Some(tolerance) => writeln!(
            out,
            "Columns with base at Z=0 (±{tolerance} m), grouped by family and dimension:"
        )?,
        None => writeln!(out, "Bounding-box based column height summary (meters):")?,
    }
    writeln!(out)?;

    for (family, dims) in &survey.families {
        writeln!(out, "{family} columns:")?;
        for (dim, heights) in dims {
            let total: usize = heights.values().sum();
            let summary = heights
                .iter()
                .map(|(mm, n)| format!("{:?} m (x{n})", *mm as f64 / 1000.0))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "  {dim}: {total} columns, heights = [{summary}]")?;
        }
        writeln!(out)?;
    }

    writeln!(
        out,
        "Nominal axial capacities (fc = {strength:.1} N/mm², gamma = {gamma_m:.2}):"
    )?;
    writeln!(out)?;
    for (family, dims) in &survey.families {
        writeln!(out, "{family} columns:")?;
        for dim in dims.keys() {
            let Some(area_m2) = parse_dimension_text(dim) else {
                continue;
            };
            if let Some(nrd) = design_resistance_kn(Some(strength), Some(area_m2), gamma_m) {
                writeln!(
                    out,
                    "  {dim} -> A = {:.0} mm², Nrd = {nrd:.1} kN",
                    area_m2 * 1e6
                )?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// family → dimension label → count
#[derive(Debug, Default, Serialize)]
pub struct Inventory {
    pub total: usize,
    pub families: BTreeMap<String, BTreeMap<String, usize>>,
}

/// Counts every column by name-derived family and dimension label.
#[must_use]
pub fn inventory(model: &IfcModel) -> Inventory {
    let mut inventory = Inventory::default();
    for column in model.columns() {
        inventory.total += 1;
        *inventory
            .families
            .entry(name_family(&column).to_string())
            .or_default()
            .entry(dimension_key(&column))
            .or_default() += 1;
    }
    inventory
}

pub fn render_inventory<W: Write>(inventory: &Inventory, out: &mut W) -> Result<(), ReportError> {
    writeln!(out, "Column inventory: {} column(s)", inventory.total)?;
    for (family, dims) in &inventory.families {
        let family_total: usize = dims.values().sum();
        writeln!(out, "{family}: {family_total}")?;
        for (dim, count) in dims {
            writeln!(out, "  {dim}: {count}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SolidEvaluator;
    use crate::parser::model_from_str;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    #[test]
    fn dimension_labels() {
        assert_relative_eq!(parse_dimension_text("400 x 400mm").unwrap(), 0.16, epsilon = 1e-12);
        assert_relative_eq!(parse_dimension_text("40×50 cm").unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(parse_dimension_text("0.3X0.3 m").unwrap(), 0.09, epsilon = 1e-12);
        assert_relative_eq!(parse_dimension_text("200x300").unwrap(), 0.06, epsilon = 1e-12);
        assert_eq!(parse_dimension_text("HEB 300"), None);
        assert_eq!(parse_dimension_text(UNKNOWN_DIMENSION), None);
    }

    /// Two concrete columns from z = 0, one raised concrete column and one
    /// unnamed column.
    fn survey_model() -> IfcModel {
        let column = |id: u64, name: &str, z: f64, height: f64| {
            format!(
                "#{p}=IFCCARTESIANPOINT((0.,0.,{z:?}));
                 #{a}=IFCAXIS2PLACEMENT3D(#{p},$,$);
                 #{l}=IFCLOCALPLACEMENT($,#{a});
                 #{s}=IFCEXTRUDEDAREASOLID(#1,$,$,{height:?});
                 #{r}=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#{s}));
                 #{d}=IFCPRODUCTDEFINITIONSHAPE($,$,(#{r}));
                 #{id}=IFCCOLUMN('g{id}',$,'{name}',$,$,#{l},#{d},$,$);",
                p = id + 1,
                a = id + 2,
                l = id + 3,
                s = id + 4,
                r = id + 5,
                d = id + 6,
            )
        };
        let body = [
            "#1=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,400.,400.);".to_string(),
            column(10, "Concrete-Column:400 x 400mm", 0.0, 3000.0),
            column(20, "Concrete-Column:400 x 400mm", 0.0, 3000.4),
            column(30, "Concrete-Column:400 x 400mm", 3000.0, 2750.0),
            column(40, "Column", 0.0, 3000.0),
        ]
        .join("\n");
        model_from_str(&format!("DATA;\n{body}\nENDSEC;"), "survey.ifc".to_string()).unwrap()
    }

    #[test]
    fn heights_grouped_and_rounded() {
        let model = survey_model();
        let survey = survey_heights(&model, &SolidEvaluator::new(&model, 1e-3), None);
        let heights = &survey.families["Concrete"]["400 x 400mm"];
        assert_eq!(heights.get(&3000), Some(&2));
        assert_eq!(heights.get(&2750), Some(&1));
        assert_eq!(survey.families.len(), 1);
    }

    #[test]
    fn base_filter_keeps_ground_columns() {
        let model = survey_model();
        let survey = survey_heights(
            &model,
            &SolidEvaluator::new(&model, 1e-3),
            Some(BASE_TOLERANCE_M),
        );
        assert_eq!(survey.count("Concrete", "400 x 400mm"), 2);
    }

    #[test]
    fn rendered_survey() {
        let model = survey_model();
        let survey = survey_heights(&model, &SolidEvaluator::new(&model, 1e-3), None);
        let mut out = Vec::new();
        render_heights(&survey, 35.0, 1.45, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  400 x 400mm: 3 columns, heights = [2.75 m (x1), 3.0 m (x2)]"));
        assert!(text.contains("  400 x 400mm -> A = 160000 mm², Nrd = 3862.1 kN"));
    }

    #[test]
    fn inventory_counts_every_column() {
        let inventory = inventory(&survey_model());
        assert_eq!(inventory.total, 4);
        assert_eq!(inventory.families["Concrete"]["400 x 400mm"], 3);
        assert_eq!(inventory.families[UNKNOWN_FAMILY][UNKNOWN_DIMENSION], 1);
    }
}
