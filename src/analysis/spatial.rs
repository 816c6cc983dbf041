//! Locating the building storey that contains an element.

use std::collections::HashSet;

use crate::model::{IfcModel, Storey};

/// Upper bound on decomposition steps climbed from one spatial structure.
pub const MAX_CLIMB_STEPS: usize = 64;

/// Finds the storey containing `element`.
///
/// Each spatial containment of the element is tried in order; a structure
/// that is not itself a storey is climbed through its decomposition parents
/// until a storey, a dead end or an already visited node is reached.
#[must_use]
pub fn find_storey(model: &IfcModel, element: u64) -> Option<Storey> {
    model
        .containing_structures(element)
        .iter()
        .find_map(|&structure| climb_to_storey(model, structure))
}

/// Walks up from `start` (inclusive) to the nearest storey.
#[must_use]
pub fn climb_to_storey(model: &IfcModel, start: u64) -> Option<Storey> {
    let mut visited = HashSet::new();
    let mut current = start;

    for _ in 0..MAX_CLIMB_STEPS {
        if !visited.insert(current) {
            tracing::debug!(entity = current, "Cycle in spatial decomposition");
            return None;
        }
        model.entity(current)?;
        if let Some(storey) = model.storey(current) {
            return Some(storey);
        }
        current = model.decomposition_parent(current)?;
    }

    tracing::debug!(start, "Gave up climbing spatial decomposition");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model_from_str;

    fn model(body: &str) -> IfcModel {
        model_from_str(&format!("DATA;\n{body}\nENDSEC;"), "spatial.ifc".to_string()).unwrap()
    }

    #[test]
    fn direct_containment_in_storey() {
        let m = model(
            "#1=IFCBUILDINGSTOREY('s',$,'01',$,$,$,$,'First floor',.ELEMENT.,0.);
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #20=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#10),#1);",
        );
        let storey = find_storey(&m, 10).unwrap();
        assert_eq!(storey.id, 1);
        assert_eq!(storey.display_name(), "First floor");
    }

    #[test]
    fn climbs_from_space_to_storey() {
        let m = model(
            "#1=IFCBUILDINGSTOREY('s',$,'U1',$,$,$,$,$,.ELEMENT.,-3000.);
             #2=IFCSPACE('sp',$,'Room',$,$,$,$,$,.ELEMENT.,$,$);
             #3=IFCRELAGGREGATES('a',$,$,$,#1,(#2));
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #20=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#10),#2);",
        );
        assert_eq!(find_storey(&m, 10).map(|s| s.id), Some(1));
    }

    #[test]
    fn cycles_terminate_without_a_storey() {
        let m = model(
            "#2=IFCSPACE('a',$,'A',$,$,$,$,$,.ELEMENT.,$,$);
             #3=IFCSPACE('b',$,'B',$,$,$,$,$,.ELEMENT.,$,$);
             #4=IFCRELAGGREGATES('x',$,$,$,#2,(#3));
             #5=IFCRELAGGREGATES('y',$,$,$,#3,(#2));
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #20=IFCRELCONTAINEDINSPATIALSTRUCTURE('r',$,$,$,(#10),#2);",
        );
        assert!(find_storey(&m, 10).is_none());
    }

    #[test]
    fn dead_end_falls_through_to_next_containment() {
        let m = model(
            "#1=IFCBUILDINGSTOREY('s',$,'02',$,$,$,$,$,.ELEMENT.,3000.);
             #2=IFCSPACE('a',$,'Orphan',$,$,$,$,$,.ELEMENT.,$,$);
             #10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);
             #20=IFCRELCONTAINEDINSPATIALSTRUCTURE('r1',$,$,$,(#10),#2);
             #21=IFCRELCONTAINEDINSPATIALSTRUCTURE('r2',$,$,$,(#10),#1);",
        );
        assert_eq!(find_storey(&m, 10).map(|s| s.id), Some(1));
    }

    #[test]
    fn uncontained_element_has_no_storey() {
        let m = model("#10=IFCCOLUMN('c',$,$,$,$,$,$,$,$);");
        assert!(find_storey(&m, 10).is_none());
    }
}
