//! Property containers attached to material definitions.

use super::IfcModel;
use crate::parser::StepValue;

/// Entity types that hold material properties, with the index of the
/// attribute pointing back at the material definition.
pub const MATERIAL_PROPERTY_TYPES: &[(&str, usize)] = &[
    ("IFCMATERIALPROPERTIES", 3),
    ("IFCEXTENDEDMATERIALPROPERTIES", 0),
    ("IFCMECHANICALCONCRETEMATERIALPROPERTIES", 0),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    SingleValue {
        name: String,
        value: Option<StepValue>,
    },
    ListValue {
        name: String,
        values: Vec<StepValue>,
    },
    Other {
        name: String,
    },
}

impl Property {
    #[must_use]
    pub fn decode(model: &IfcModel, id: u64) -> Option<Self> {
        let entity = model.entity(id)?;
        let name = entity.string(0).unwrap_or_default().to_string();
        let property = match entity.entity_type.as_str() {
            "IFCPROPERTYSINGLEVALUE" => Property::SingleValue {
                name,
                value: entity.attr(2).filter(|v| **v != StepValue::Null).cloned(),
            },
            "IFCPROPERTYLISTVALUE" => Property::ListValue {
                name,
                values: entity
                    .attr(2)
                    .and_then(StepValue::as_list)
                    .map(<[StepValue]>::to_vec)
                    .unwrap_or_default(),
            },
            _ => Property::Other { name },
        };
        Some(property)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Property::SingleValue { name, .. }
            | Property::ListValue { name, .. }
            | Property::Other { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyContainer {
    /// `IfcPropertySet`, IFC4 `IfcMaterialProperties` or IFC2x3
    /// `IfcExtendedMaterialProperties`.
    Named {
        id: u64,
        name: Option<String>,
        properties: Vec<u64>,
    },
    /// IFC2x3 `IfcMechanicalConcreteMaterialProperties`.
    MechanicalConcrete {
        id: u64,
        compressive_strength: Option<f64>,
    },
}

impl PropertyContainer {
    #[must_use]
    pub fn decode(model: &IfcModel, id: u64) -> Option<Self> {
        let entity = model.entity(id)?;
        let container = match entity.entity_type.as_str() {
            "IFCPROPERTYSET" => PropertyContainer::Named {
                id,
                name: entity.string(2).map(str::to_string),
                properties: entity.references(4),
            },
            "IFCMATERIALPROPERTIES" => PropertyContainer::Named {
                id,
                name: entity.string(0).map(str::to_string),
                properties: entity.references(2),
            },
            "IFCEXTENDEDMATERIALPROPERTIES" => PropertyContainer::Named {
                id,
                name: entity.string(3).map(str::to_string),
                properties: entity.references(1),
            },
            "IFCMECHANICALCONCRETEMATERIALPROPERTIES" => PropertyContainer::MechanicalConcrete {
                id,
                compressive_strength: entity.real(6),
            },
            _ => return None,
        };
        Some(container)
    }

    /// Lower-cased container name; concrete-specific containers without a
    /// name report `"concrete"`.
    #[must_use]
    pub fn search_name(&self) -> String {
        match self {
            PropertyContainer::Named { name, .. } => name.as_deref().unwrap_or("").to_lowercase(),
            PropertyContainer::MechanicalConcrete { .. } => "concrete".to_string(),
        }
    }
}
