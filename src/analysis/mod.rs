//! Per-column analysis steps: units, storey lookup and filtering, material,
//! section and capacity.

pub mod capacity;
pub mod filter;
pub mod material;
pub mod section;
pub mod spatial;
pub mod units;

pub use capacity::{design_resistance_kn, CapacityCheck, CapacityStatus};
pub use filter::{FilterValue, StoreyFilter};
pub use material::{resolve_material, MaterialInfo, StrengthContext, StrengthSource};
pub use section::{resolve_section, Precision, SectionGeometry, SectionSource};
pub use spatial::find_storey;
pub use units::length_unit_scale;
