//! Material definitions reachable through `IfcRelAssociatesMaterial`.

use super::IfcModel;
use crate::parser::StepEntity;

/// One entry of a profile, layer or constituent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialItem {
    pub material: Option<u64>,
    /// Only material profiles carry a profile definition.
    pub profile: Option<u64>,
}

/// The association shapes a relating material can take.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialDef {
    Material { id: u64, name: Option<String> },
    ProfileSetUsage { id: u64, profile_set: Option<u64> },
    ProfileSet { id: u64, items: Vec<MaterialItem> },
    LayerSetUsage { id: u64, layer_set: Option<u64> },
    LayerSet { id: u64, items: Vec<MaterialItem> },
    ConstituentSet { id: u64, items: Vec<MaterialItem> },
    /// IFC2x3 `IfcMaterialList`
    MaterialList { id: u64, materials: Vec<u64> },
}

impl MaterialDef {
    /// Classifies the entity by type before reading any attribute.
    /// Unknown entity types yield `None`.
    #[must_use]
    pub fn decode(model: &IfcModel, id: u64) -> Option<Self> {
        let entity = model.entity(id)?;
        let def = match entity.entity_type.as_str() {
            "IFCMATERIAL" => MaterialDef::Material {
                id,
                name: entity.string(0).map(str::to_string),
            },
            "IFCMATERIALPROFILESETUSAGE" | "IFCMATERIALPROFILESETUSAGETAPERING" => {
                MaterialDef::ProfileSetUsage {
                    id,
                    profile_set: entity.reference(0),
                }
            }
            "IFCMATERIALPROFILESET" => MaterialDef::ProfileSet {
                id,
                items: set_items(model, entity, 2, 2, Some(3)),
            },
            "IFCMATERIALLAYERSETUSAGE" => MaterialDef::LayerSetUsage {
                id,
                layer_set: entity.reference(0),
            },
            "IFCMATERIALLAYERSET" => MaterialDef::LayerSet {
                id,
                items: set_items(model, entity, 0, 0, None),
            },
            "IFCMATERIALCONSTITUENTSET" => MaterialDef::ConstituentSet {
                id,
                items: set_items(model, entity, 2, 2, None),
            },
            "IFCMATERIALLIST" => MaterialDef::MaterialList {
                id,
                materials: entity.references(0),
            },
            _ => return None,
        };
        Some(def)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            MaterialDef::Material { id, .. }
            | MaterialDef::ProfileSetUsage { id, .. }
            | MaterialDef::ProfileSet { id, .. }
            | MaterialDef::LayerSetUsage { id, .. }
            | MaterialDef::LayerSet { id, .. }
            | MaterialDef::ConstituentSet { id, .. }
            | MaterialDef::MaterialList { id, .. } => *id,
        }
    }

    /// The set a usage points at; sets and materials resolve to themselves.
    #[must_use]
    pub fn resolve_usage(self, model: &IfcModel) -> Option<Self> {
        match self {
            MaterialDef::ProfileSetUsage { profile_set, .. } => {
                MaterialDef::decode(model, profile_set?)
            }
            MaterialDef::LayerSetUsage { layer_set, .. } => MaterialDef::decode(model, layer_set?),
            other => Some(other),
        }
    }

    /// Materials referenced by this definition, in declaration order.
    #[must_use]
    pub fn material_ids(&self) -> Vec<u64> {
        match self {
            MaterialDef::Material { id, .. } => vec![*id],
            MaterialDef::ProfileSet { items, .. }
            | MaterialDef::LayerSet { items, .. }
            | MaterialDef::ConstituentSet { items, .. } => {
                items.iter().filter_map(|item| item.material).collect()
            }
            MaterialDef::MaterialList { materials, .. } => materials.clone(),
            MaterialDef::ProfileSetUsage { .. } | MaterialDef::LayerSetUsage { .. } => Vec::new(),
        }
    }
}

/// Name of an `IfcMaterial`.
#[must_use]
pub fn material_name(model: &IfcModel, id: u64) -> Option<String> {
    model
        .entity_of_type(id, "IFCMATERIAL")
        .and_then(|m| m.string(0))
        .map(str::to_string)
}

fn set_items(
    model: &IfcModel,
    set: &StepEntity,
    list_index: usize,
    material_index: usize,
    profile_index: Option<usize>,
) -> Vec<MaterialItem> {
    set.references(list_index)
        .into_iter()
        .filter_map(|item_id| model.entity(item_id))
        .map(|item| MaterialItem {
            material: item.reference(material_index),
            profile: profile_index.and_then(|i| item.reference(i)),
        })
        .collect()
}
