pub mod column;
pub mod ifc_model;
pub mod material;
pub mod profile;
pub mod property;
pub mod storey;

pub use column::Column;
pub use ifc_model::{IfcModel, RelationshipIndex};
pub use material::{MaterialDef, MaterialItem};
pub use profile::{FlangeKind, Profile, ProfileShape};
pub use property::{Property, PropertyContainer};
pub use storey::Storey;
