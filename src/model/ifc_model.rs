use std::collections::HashMap;

use super::column::COLUMN_TYPES;
use super::{Column, Storey};
use crate::parser::{StepEntity, StepFile};

/// Inverse relationships of the model, keyed by the related object's id.
///
/// Lists keep relationship id order so that "first association wins"
/// lookups are deterministic.
#[derive(Debug, Default)]
pub struct RelationshipIndex {
    /// element → spatial structures (`IfcRelContainedInSpatialStructure`)
    pub contained_in: HashMap<u64, Vec<u64>>,
    /// child → relating objects (`IfcRelAggregates`, `IfcRelNests`)
    pub decomposes: HashMap<u64, Vec<u64>>,
    /// object or type → material definitions (`IfcRelAssociatesMaterial`)
    pub materials: HashMap<u64, Vec<u64>>,
    /// element → type (`IfcRelDefinesByType`)
    pub typed_by: HashMap<u64, u64>,
    /// material definition → property containers
    pub material_properties: HashMap<u64, Vec<u64>>,
}

/// A loaded IFC model: the raw entity store plus relationship indices.
#[derive(Debug)]
pub struct IfcModel {
    pub file_path: String,
    step: StepFile,
    relations: RelationshipIndex,
}

impl IfcModel {
    #[must_use]
    pub fn new(step: StepFile, relations: RelationshipIndex, file_path: String) -> Self {
        Self {
            file_path,
            step,
            relations,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.step.schema
    }

    #[must_use]
    pub fn entity(&self, id: u64) -> Option<&StepEntity> {
        self.step.get_entity(id)
    }

    /// Entity only if it has the given type.
    #[must_use]
    pub fn entity_of_type(&self, id: u64, entity_type: &str) -> Option<&StepEntity> {
        self.entity(id).filter(|e| e.is(entity_type))
    }

    #[must_use]
    pub fn entities_of_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        self.step.get_entities_by_type(entity_type)
    }

    /// All columns (including standard-case subtypes) in ascending id order.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let mut entities: Vec<&StepEntity> = COLUMN_TYPES
            .iter()
            .flat_map(|t| self.entities_of_type(t))
            .collect();
        entities.sort_by_key(|e| e.id);
        entities.into_iter().map(Column::from_entity).collect()
    }

    #[must_use]
    pub fn storey(&self, id: u64) -> Option<Storey> {
        self.entity(id).and_then(Storey::from_entity)
    }

    #[must_use]
    pub fn containing_structures(&self, element: u64) -> &[u64] {
        self.relations
            .contained_in
            .get(&element)
            .map_or(&[], Vec::as_slice)
    }

    /// The first relating object of a decomposition the entity takes part in.
    #[must_use]
    pub fn decomposition_parent(&self, child: u64) -> Option<u64> {
        self.relations
            .decomposes
            .get(&child)
            .and_then(|parents| parents.first().copied())
    }

    /// First material association declared directly on the object.
    #[must_use]
    pub fn material_association(&self, object: u64) -> Option<u64> {
        self.material_associations(object).first().copied()
    }

    #[must_use]
    pub fn material_associations(&self, object: u64) -> &[u64] {
        self.relations
            .materials
            .get(&object)
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn type_of(&self, element: u64) -> Option<u64> {
        self.relations.typed_by.get(&element).copied()
    }

    #[must_use]
    pub fn material_property_containers(&self, material_def: u64) -> &[u64] {
        self.relations
            .material_properties
            .get(&material_def)
            .map_or(&[], Vec::as_slice)
    }
}
