//! Plain-text rendering of a [`CapacityReport`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{CapacityReport, ColumnRecord, Summary};
use crate::error::ReportError;

const RULE_WIDTH: usize = 80;

/// Writes the report text to `out`.
pub fn render<W: Write>(report: &CapacityReport, out: &mut W) -> Result<(), ReportError> {
    let header = &report.header;
    let rule = "-".repeat(RULE_WIDTH);

    writeln!(out, "CAPACITY CONTROL REPORT (IfcColumn, storey filter)")?;
    writeln!(
        out,
        "Filter mode: {} | Filter value: {}",
        header.filter_mode, header.filter_value
    )?;
    writeln!(
        out,
        "Ned = {:.2} kN | gamma_mo = {:.2} | fc_default = {:.1} N/mm²",
        header.demand_load_kn, header.gamma_m, header.default_strength
    )?;
    writeln!(out, "Model: {}", header.model_path)?;
    writeln!(out, "{rule}")?;

    for record in &report.records {
        render_column(record, out)?;
    }

    writeln!(out, "{rule}")?;
    render_summary(&report.summary, out)?;
    writeln!(out, "End of report.")?;
    Ok(())
}

fn render_column<W: Write>(record: &ColumnRecord, out: &mut W) -> Result<(), ReportError> {
    writeln!(out, "- GlobalId: {}", record.global_id)?;
    writeln!(out, "  Storey: {}", record.storey)?;

    match &record.section {
        Some(section) => {
            let approx = if section.is_approximate() { "~" } else { "" };
            writeln!(
                out,
                "  Dimensions: {:.0} × {:.0} mm | A = {approx}{:.0} mm²",
                section.width_mm(),
                section.height_mm(),
                section.area_mm2()
            )?;
        }
        None => writeln!(out, "  Dimensions: <unknown> | A = <unknown>")?,
    }

    let material = &record.material;
    writeln!(
        out,
        "  Material: {} ({}) | fc used = {:.1} N/mm² (source: {})",
        material.family,
        material.short_names(),
        material.strength,
        material.strength_source
    )?;

    let check = &record.check;
    match (check.resistance_kn, check.utilization) {
        (Some(nrd), Some(utilization)) => writeln!(
            out,
            "  Nrd = {nrd:.1} kN  vs  Ned = {:.1} kN  → {} (utilization = {utilization:.2}%)",
            check.demand_kn, check.status
        )?,
        _ => writeln!(out, "  Nrd = <unknown> (missing area/dimensions)")?,
    }
    writeln!(out)?;
    Ok(())
}

fn render_summary<W: Write>(summary: &Summary, out: &mut W) -> Result<(), ReportError> {
    writeln!(
        out,
        "TOTAL: {} checked columns | OK: {} | NOT OK: {}",
        summary.total(),
        summary.ok,
        summary.not_ok
    )?;
    if summary.unresolved > 0 {
        writeln!(out, "Unresolved geometry: {} column(s)", summary.unresolved)?;
    }
    if let Some(worst) = &summary.worst {
        writeln!(
            out,
            "Worst utilization: {:.2}%  (GlobalId {}, Nrd={:.1} kN, dim≈ {:.0}×{:.0} mm)",
            worst.utilization, worst.global_id, worst.resistance_kn, worst.width_mm, worst.height_mm
        )?;
    }
    Ok(())
}

/// Renders the report into a file, replacing any existing one.
pub fn write_report_file<P: AsRef<Path>>(report: &CapacityReport, path: P) -> Result<(), ReportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ReportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    render(report, &mut writer)?;
    writer.flush()?;

    tracing::info!(path = %path_ref.display(), "Wrote capacity report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{
        CapacityCheck, MaterialInfo, Precision, SectionGeometry, SectionSource, StrengthSource,
    };
    use crate::report::{ReportHeader, WorstCase};
    use pretty_assertions::assert_eq;

    fn header() -> ReportHeader {
        ReportHeader {
            filter_mode: "name_contains".to_string(),
            filter_value: "-1".to_string(),
            demand_load_kn: 882.78,
            gamma_m: 1.45,
            default_strength: 35.0,
            model_path: "model.ifc".to_string(),
        }
    }

    #[test]
    fn renders_resolved_and_unknown_columns() {
        let resolved = ColumnRecord {
            id: 10,
            global_id: "2O2Fr$t4X7Zf8NOew3FLOH".to_string(),
            name: "Column:200 x 200mm".to_string(),
            storey: "Plan -1".to_string(),
            section: Some(SectionGeometry {
                width_m: 0.2,
                height_m: 0.2,
                area_m2: 0.04,
                precision: Precision::Exact,
                source: SectionSource::MaterialProfile,
            }),
            material: MaterialInfo {
                names: vec!["Concrete".to_string()],
                family: "Concrete".to_string(),
                strength: 35.0,
                strength_source: StrengthSource::Default,
            },
            check: CapacityCheck::evaluate(Some(35.0 * 40_000.0 / 1.45 / 1000.0), 882.78),
        };
        let unknown = ColumnRecord {
            id: 11,
            global_id: "1kTvXnbbzCWw8lcMd1dR4o".to_string(),
            name: "Column".to_string(),
            storey: "<unknown storey>".to_string(),
            section: None,
            material: MaterialInfo {
                names: Vec::new(),
                family: "Unknown".to_string(),
                strength: 35.0,
                strength_source: StrengthSource::Default,
            },
            check: CapacityCheck::evaluate(None, 882.78),
        };

        let mut summary = Summary::default();
        summary.record(&resolved);
        summary.record(&unknown);
        let report = CapacityReport {
            header: header(),
            records: vec![resolved, unknown],
            summary,
        };

        let mut out = Vec::new();
        render(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rule = "-".repeat(80);

        let expected = format!(
            "CAPACITY CONTROL REPORT (IfcColumn, storey filter)
Filter mode: name_contains | Filter value: -1
Ned = 882.78 kN | gamma_mo = 1.45 | fc_default = 35.0 N/mm²
Model: model.ifc
{rule}
- GlobalId: 2O2Fr$t4X7Zf8NOew3FLOH
  Storey: Plan -1
  Dimensions: 200 × 200 mm | A = 40000 mm²
  Material: Concrete (Concrete) | fc used = 35.0 N/mm² (source: default)
  Nrd = 965.5 kN  vs  Ned = 882.8 kN  → OK (utilization = 91.43%)

- GlobalId: 1kTvXnbbzCWw8lcMd1dR4o
  Storey: <unknown storey>
  Dimensions: <unknown> | A = <unknown>
  Material: Unknown (<unknown>) | fc used = 35.0 N/mm² (source: default)
  Nrd = <unknown> (missing area/dimensions)

{rule}
TOTAL: 1 checked columns | OK: 1 | NOT OK: 0
Unresolved geometry: 1 column(s)
Worst utilization: 91.43%  (GlobalId 2O2Fr$t4X7Zf8NOew3FLOH, Nrd=965.5 kN, dim≈ 200×200 mm)
End of report.
"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn approximate_area_is_marked() {
        let mut out = Vec::new();
        let record = ColumnRecord {
            id: 1,
            global_id: "g".to_string(),
            name: String::new(),
            storey: "s".to_string(),
            section: Some(SectionGeometry {
                width_m: 0.6,
                height_m: 0.25,
                area_m2: 0.15,
                precision: Precision::Approximate,
                source: SectionSource::BoundingBox,
            }),
            material: MaterialInfo {
                names: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                family: "Unknown".to_string(),
                strength: 35.0,
                strength_source: StrengthSource::Default,
            },
            check: CapacityCheck::evaluate(Some(100.0), 200.0),
        };
        render_column(&record, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Dimensions: 600 × 250 mm | A = ~150000 mm²"));
        assert!(text.contains("(a, b)"));
        assert!(text.contains("→ NOT OK (utilization = 200.00%)"));
    }

    #[test]
    fn empty_report_has_no_worst_case() {
        let report = CapacityReport {
            header: header(),
            records: Vec::new(),
            summary: Summary {
                worst: None::<WorstCase>,
                ..Summary::default()
            },
        };
        let mut out = Vec::new();
        render(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("TOTAL: 0 checked columns | OK: 0 | NOT OK: 0\nEnd of report.\n"));
        assert!(!text.contains("Worst"));
    }
}
