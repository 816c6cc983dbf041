use crate::analysis::SectionGeometry;
use crate::error::ExportError;
use crate::report::CapacityReport;
use std::fs::File;
use std::path::Path;

fn optional(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.precision$}"))
}

/// One row per checked column. Unknown values are left empty.
pub fn export_csv<P: AsRef<Path>>(report: &CapacityReport, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record([
        "GlobalId",
        "Name",
        "Storey",
        "Width (mm)",
        "Height (mm)",
        "Area (mm2)",
        "Area Precision",
        "Section Source",
        "Material Family",
        "Materials",
        "fc (N/mm2)",
        "fc Source",
        "Nrd (kN)",
        "Ned (kN)",
        "Utilization (%)",
        "Status",
    ])?;

    for record in &report.records {
        let section = record.section.as_ref();
        let material = &record.material;
        let check = &record.check;

        writer.write_record([
            record.global_id.clone(),
            record.name.clone(),
            record.storey.clone(),
            optional(section.map(SectionGeometry::width_mm), 0),
            optional(section.map(SectionGeometry::height_mm), 0),
            optional(section.map(SectionGeometry::area_mm2), 0),
            section.map(|s| s.precision.to_string()).unwrap_or_default(),
            section.map(|s| s.source.to_string()).unwrap_or_default(),
            material.family.clone(),
            material.names.join("; "),
            format!("{:.1}", material.strength),
            material.strength_source.to_string(),
            optional(check.resistance_kn, 1),
            format!("{:.2}", check.demand_kn),
            optional(check.utilization, 2),
            check.status.to_string(),
        ])?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })?;

    tracing::info!(path = %path_ref.display(), rows = report.records.len(), "Exported CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{CapacityCheck, MaterialInfo, Precision, SectionSource, StrengthSource};
    use crate::report::{ColumnRecord, ReportHeader, Summary};

    #[test]
    fn writes_one_row_per_column() {
        let report = CapacityReport {
            header: ReportHeader {
                filter_mode: "name_contains".to_string(),
                filter_value: "-1".to_string(),
                demand_load_kn: 882.78,
                gamma_m: 1.45,
                default_strength: 35.0,
                model_path: "m.ifc".to_string(),
            },
            records: vec![ColumnRecord {
                id: 1,
                global_id: "g1".to_string(),
                name: "Column, round".to_string(),
                storey: "Plan -1".to_string(),
                section: Some(SectionGeometry {
                    width_m: 0.4,
                    height_m: 0.3,
                    area_m2: 0.12,
                    precision: Precision::Exact,
                    source: SectionSource::SweptSolid,
                }),
                material: MaterialInfo {
                    names: vec!["C30/37".to_string()],
                    family: "Concrete".to_string(),
                    strength: 30.0,
                    strength_source: StrengthSource::Name,
                },
                check: CapacityCheck::evaluate(None, 882.78),
            }],
            summary: Summary::default(),
        };

        let dir = std::env::temp_dir().join("ifc-column-check-csv-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("columns.csv");
        export_csv(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("GlobalId,Name,Storey"));
        assert_eq!(
            lines.next().unwrap(),
            "g1,\"Column, round\",Plan -1,400,300,120000,exact,swept-solid,Concrete,C30/37,30.0,name,,882.78,,UNKNOWN"
        );
        assert!(lines.next().is_none());
    }
}
