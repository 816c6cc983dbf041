//! Capacity report: per-column records and the run summary.

pub mod render;

use serde::Serialize;

use crate::analysis::{
    design_resistance_kn, find_storey, length_unit_scale, resolve_material, resolve_section,
    CapacityCheck, CapacityStatus, MaterialInfo, SectionGeometry, StrengthContext,
};
use crate::config::CheckConfig;
use crate::geometry::ShapeEvaluator;
use crate::model::IfcModel;

pub use render::{render, write_report_file};

/// Everything the report shows for one column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnRecord {
    pub id: u64,
    pub global_id: String,
    pub name: String,
    pub storey: String,
    pub section: Option<SectionGeometry>,
    pub material: MaterialInfo,
    pub check: CapacityCheck,
}

/// The column with the highest utilization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorstCase {
    pub utilization: f64,
    pub global_id: String,
    pub resistance_kn: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub ok: usize,
    pub not_ok: usize,
    /// Columns rendered with an unknown resistance.
    pub unresolved: usize,
    pub worst: Option<WorstCase>,
}

impl Summary {
    /// Columns with a computed resistance.
    #[must_use]
    pub fn total(&self) -> usize {
        self.ok + self.not_ok
    }

    /// Counts a record and keeps the first record with the highest
    /// utilization.
    pub fn record(&mut self, record: &ColumnRecord) {
        let check = &record.check;
        match check.status {
            CapacityStatus::Ok => self.ok += 1,
            CapacityStatus::NotOk => self.not_ok += 1,
            CapacityStatus::Unknown => {
                self.unresolved += 1;
                return;
            }
        }

        let (Some(utilization), Some(resistance_kn)) = (check.utilization, check.resistance_kn)
        else {
            return;
        };
        let best_so_far = self.worst.as_ref().map_or(-1.0, |w| w.utilization);
        if utilization > best_so_far {
            let (width_mm, height_mm) = record
                .section
                .map_or((0.0, 0.0), |s| (s.width_mm(), s.height_mm()));
            self.worst = Some(WorstCase {
                utilization,
                global_id: record.global_id.clone(),
                resistance_kn,
                width_mm,
                height_mm,
            });
        }
    }
}

/// Run parameters echoed in the report header.
#[derive(Debug, Clone, Serialize)]
pub struct ReportHeader {
    pub filter_mode: String,
    pub filter_value: String,
    pub demand_load_kn: f64,
    pub gamma_m: f64,
    pub default_strength: f64,
    pub model_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityReport {
    pub header: ReportHeader,
    pub records: Vec<ColumnRecord>,
    pub summary: Summary,
}

/// Runs the check over every column of the model, in id order.
///
/// Columns without a storey, or whose storey the filter rejects, are left
/// out. Per-column failures never abort the run.
#[must_use]
pub fn assemble(model: &IfcModel, config: &CheckConfig, evaluator: &dyn ShapeEvaluator) -> CapacityReport {
    let unit_scale = length_unit_scale(model);
    let context = StrengthContext {
        default_strength: config.default_strength,
    };

    let mut records = Vec::new();
    let mut summary = Summary::default();

    for column in model.columns() {
        let Some(storey) = find_storey(model, column.id) else {
            tracing::debug!(column = column.id, "Column has no storey, skipped");
            continue;
        };
        if !config.storey_filter.matches(&storey, unit_scale) {
            continue;
        }

        let material = resolve_material(model, column.id, context);
        let section = resolve_section(model, &column, unit_scale, evaluator);
        let resistance = design_resistance_kn(
            Some(material.strength),
            section.map(|s| s.area_m2),
            config.gamma_m,
        );
        let check = CapacityCheck::evaluate(resistance, config.demand_load_kn);

        let record = ColumnRecord {
            id: column.id,
            global_id: column.global_id,
            name: column.name,
            storey: storey.display_name().to_string(),
            section,
            material,
            check,
        };
        summary.record(&record);
        records.push(record);
    }

    tracing::info!(
        checked = summary.total(),
        ok = summary.ok,
        not_ok = summary.not_ok,
        unresolved = summary.unresolved,
        "Capacity check finished"
    );

    CapacityReport {
        header: ReportHeader {
            filter_mode: config.storey_filter.mode().to_string(),
            filter_value: config.storey_filter.to_string(),
            demand_load_kn: config.demand_load_kn,
            gamma_m: config.gamma_m,
            default_strength: config.default_strength,
            model_path: config.model_path.display().to_string(),
        },
        records,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Precision, SectionSource, StrengthSource};
    use pretty_assertions::assert_eq;

    fn record(global_id: &str, resistance_kn: Option<f64>) -> ColumnRecord {
        ColumnRecord {
            id: 1,
            global_id: global_id.to_string(),
            name: String::new(),
            storey: "Plan -1".to_string(),
            section: Some(SectionGeometry {
                width_m: 0.4,
                height_m: 0.4,
                area_m2: 0.16,
                precision: Precision::Exact,
                source: SectionSource::MaterialProfile,
            }),
            material: MaterialInfo {
                names: vec!["C30/37".to_string()],
                family: "Concrete".to_string(),
                strength: 30.0,
                strength_source: StrengthSource::Name,
            },
            check: CapacityCheck::evaluate(resistance_kn, 100.0),
        }
    }

    #[test]
    fn first_of_equal_worst_utilizations_wins() {
        // 50 %, 80 %, 80 %, 30 %
        let mut summary = Summary::default();
        for (id, nrd) in [("a", 200.0), ("b", 125.0), ("c", 125.0), ("d", 1000.0 / 3.0)] {
            summary.record(&record(id, Some(nrd)));
        }
        let worst = summary.worst.as_ref().unwrap();
        assert_eq!(worst.global_id, "b");
        assert!((worst.utilization - 80.0).abs() < 1e-9);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn unknown_columns_are_counted_apart() {
        let mut summary = Summary::default();
        summary.record(&record("a", None));
        summary.record(&record("b", Some(50.0)));
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.not_ok, 1);
        assert_eq!(summary.worst.unwrap().global_id, "b");
    }

    #[test]
    fn no_worst_case_without_resistance() {
        let mut summary = Summary::default();
        summary.record(&record("a", None));
        assert!(summary.worst.is_none());
    }
}
