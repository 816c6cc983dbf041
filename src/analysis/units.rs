//! Unit scale extraction from the model's `IfcUnitAssignment`.

use crate::model::IfcModel;
use crate::parser::StepEntity;

/// Scale from the model's length unit to meters.
///
/// Reads the first `IfcUnitAssignment`. Returns 1.0 when no length unit is
/// declared.
#[must_use]
pub fn length_unit_scale(model: &IfcModel) -> f64 {
    declared_unit(model, "LENGTHUNIT", "METRE").unwrap_or(1.0)
}

fn declared_unit(model: &IfcModel, unit_type: &str, si_name: &str) -> Option<f64> {
    let assignment = model.entities_of_type("IFCUNITASSIGNMENT").into_iter().next()?;

    assignment
        .references(0)
        .into_iter()
        .filter_map(|id| model.entity(id))
        .find_map(|unit| unit_scale(model, unit, unit_type, si_name))
}

fn unit_scale(model: &IfcModel, unit: &StepEntity, unit_type: &str, si_name: &str) -> Option<f64> {
    match unit.entity_type.as_str() {
        "IFCSIUNIT" => si_unit_scale(unit, unit_type, si_name),
        "IFCCONVERSIONBASEDUNIT" => conversion_unit_scale(model, unit, unit_type, si_name),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(unit: &StepEntity, unit_type: &str, si_name: &str) -> Option<f64> {
    if unit.enumeration(1)? != unit_type || unit.enumeration(3)? != si_name {
        return None;
    }
    Some(unit.enumeration(2).map_or(1.0, prefix_factor))
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
fn conversion_unit_scale(
    model: &IfcModel,
    unit: &StepEntity,
    unit_type: &str,
    si_name: &str,
) -> Option<f64> {
    if unit.enumeration(1)? != unit_type {
        return None;
    }

    // IFCMEASUREWITHUNIT(ValueComponent, UnitComponent)
    let factor = model.entity_of_type(unit.reference(3)?, "IFCMEASUREWITHUNIT")?;
    let value = factor.real(0)?;
    let base = model.entity_of_type(factor.reference(1)?, "IFCSIUNIT")?;
    if base.enumeration(3)? != si_name {
        return None;
    }

    Some(value * base.enumeration(2).map_or(1.0, prefix_factor))
}

fn prefix_factor(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model_from_str;
    use approx::assert_relative_eq;

    fn model(units: &str) -> IfcModel {
        let content = format!("DATA;\n{units}\nENDSEC;");
        model_from_str(&content, "units.ifc".to_string()).unwrap()
    }

    #[test]
    fn millimetre_models_scale_by_one_thousandth() {
        let m = model(
            "#1=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);
             #2=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
             #3=IFCUNITASSIGNMENT((#1,#2));",
        );
        assert_relative_eq!(length_unit_scale(&m), 1e-3);
    }

    #[test]
    fn conversion_based_feet() {
        let m = model(
            "#1=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);
             #2=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#1);
             #3=IFCCONVERSIONBASEDUNIT(#4,.LENGTHUNIT.,'FOOT',#2);
             #4=IFCDIMENSIONALEXPONENTS(1,0,0,0,0,0,0);
             #5=IFCUNITASSIGNMENT((#3));",
        );
        assert_relative_eq!(length_unit_scale(&m), 0.3048);
    }

    #[test]
    fn other_unit_types_are_ignored() {
        let m = model(
            "#1=IFCSIUNIT(*,.PRESSUREUNIT.,.MEGA.,.PASCAL.);
             #2=IFCSIUNIT(*,.LENGTHUNIT.,.CENTI.,.METRE.);
             #3=IFCUNITASSIGNMENT((#1,#2));",
        );
        assert_relative_eq!(length_unit_scale(&m), 1e-2);
    }

    #[test]
    fn defaults_to_metres() {
        let m = model("#1=IFCPROJECT('p',$,'P',$,$,$,$,$,$);");
        assert_relative_eq!(length_unit_scale(&m), 1.0);
    }
}
