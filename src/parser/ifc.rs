use crate::error::ParseError;
use crate::model::property::MATERIAL_PROPERTY_TYPES;
use crate::model::{IfcModel, RelationshipIndex};
use crate::parser::step::{StepEntity, StepFile};
use std::collections::HashMap;
use std::path::Path;

/// Relationship entities whose related objects decompose a relating object.
const DECOMPOSITION_RELATIONS: &[&str] = &["IFCRELAGGREGATES", "IFCRELNESTS"];

/// Loads an IFC file and indexes the relationships the column checks walk.
///
/// Supports both IFC2x3 and IFC4 schemas. Indexes:
/// - Spatial containment (element → spatial structure)
/// - Decomposition (child → relating object)
/// - Material associations (object or type → material definition)
/// - Type definitions (element → type)
/// - Material property containers (material definition → properties)
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
///
/// # Example
///
/// ```no_run
/// use ifc_column_check::parser::load_model;
///
/// let model = load_model("model.ifc")?;
/// println!("{} columns", model.columns().len());
/// # Ok::<(), ifc_column_check::error::ParseError>(())
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<IfcModel, ParseError> {
    let content = std::fs::read_to_string(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let file_path = path.as_ref().to_string_lossy().to_string();
    let model = model_from_str(&content, file_path)?;

    tracing::info!(
        path = %model.file_path,
        schema = %model.schema(),
        columns = model.columns().len(),
        "Loaded IFC model"
    );

    Ok(model)
}

/// Parses STEP content that is already in memory.
pub fn model_from_str(content: &str, file_path: String) -> Result<IfcModel, ParseError> {
    let step_file = StepFile::parse(content)?;
    let relations = index_relationships(&step_file);
    Ok(IfcModel::new(step_file, relations, file_path))
}

fn index_relationships(step_file: &StepFile) -> RelationshipIndex {
    RelationshipIndex {
        contained_in: extract_spatial_containment(step_file),
        decomposes: extract_decomposition(step_file),
        materials: extract_material_associations(step_file),
        typed_by: extract_type_relationships(step_file),
        material_properties: extract_material_properties(step_file),
    }
}

/// Extract element → structure relationships from IFCRELCONTAINEDINSPATIALSTRUCTURE
fn extract_spatial_containment(step_file: &StepFile) -> HashMap<u64, Vec<u64>> {
    // Index 4 = RelatedElements, index 5 = RelatingStructure
    invert_one_to_many(step_file.get_entities_by_type("IFCRELCONTAINEDINSPATIALSTRUCTURE"), 5, 4)
}

fn extract_decomposition(step_file: &StepFile) -> HashMap<u64, Vec<u64>> {
    // Index 4 = RelatingObject, index 5 = RelatedObjects
    let mut rels: Vec<&StepEntity> = DECOMPOSITION_RELATIONS
        .iter()
        .flat_map(|t| step_file.get_entities_by_type(t))
        .collect();
    rels.sort_by_key(|rel| rel.id);
    invert_one_to_many(rels, 4, 5)
}

fn extract_material_associations(step_file: &StepFile) -> HashMap<u64, Vec<u64>> {
    // Index 4 = RelatedObjects, index 5 = RelatingMaterial
    invert_one_to_many(step_file.get_entities_by_type("IFCRELASSOCIATESMATERIAL"), 5, 4)
}

fn extract_type_relationships(step_file: &StepFile) -> HashMap<u64, u64> {
    let mut element_to_type: HashMap<u64, u64> = HashMap::new();

    for rel in step_file.get_entities_by_type("IFCRELDEFINESBYTYPE") {
        // Index 4 = RelatedObjects (list of element refs)
        // Index 5 = RelatingType (type ref)
        if let Some(type_id) = rel.reference(5) {
            for element_id in rel.references(4) {
                element_to_type.entry(element_id).or_insert(type_id);
            }
        }
    }

    element_to_type
}

fn extract_material_properties(step_file: &StepFile) -> HashMap<u64, Vec<u64>> {
    let mut containers: Vec<(u64, u64)> = Vec::new();

    for (entity_type, material_index) in MATERIAL_PROPERTY_TYPES {
        for props in step_file.get_entities_by_type(entity_type) {
            if let Some(material_id) = props.reference(*material_index) {
                containers.push((props.id, material_id));
            }
        }
    }
    containers.sort_unstable();

    let mut material_properties: HashMap<u64, Vec<u64>> = HashMap::new();
    for (props_id, material_id) in containers {
        material_properties
            .entry(material_id)
            .or_default()
            .push(props_id);
    }
    material_properties
}

/// Maps each related object to the relating side of every relationship that
/// lists it, in relationship id order.
fn invert_one_to_many(
    rels: Vec<&StepEntity>,
    relating_index: usize,
    related_index: usize,
) -> HashMap<u64, Vec<u64>> {
    let mut inverse: HashMap<u64, Vec<u64>> = HashMap::new();

    for rel in rels {
        let Some(relating) = rel.reference(relating_index) else {
            continue;
        };
        for related in rel.references(related_index) {
            inverse.entry(related).or_default().push(relating);
        }
    }

    inverse
}
