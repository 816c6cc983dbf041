use serde::Serialize;

use crate::parser::StepEntity;

pub const STOREY_TYPE: &str = "IFCBUILDINGSTOREY";

#[derive(Debug, Clone, Serialize)]
pub struct Storey {
    pub id: u64,
    pub name: Option<String>,
    pub long_name: Option<String>,
    /// Elevation in model length units.
    pub elevation: Option<f64>,
}

impl Storey {
    /// Decodes an `IfcBuildingStorey`; other entity types yield `None`.
    #[must_use]
    pub fn from_entity(entity: &StepEntity) -> Option<Self> {
        if !entity.is(STOREY_TYPE) {
            return None;
        }
        Some(Self {
            id: entity.id,
            name: entity.string(2).map(str::to_string),
            long_name: entity.string(7).map(str::to_string),
            elevation: entity.real(9),
        })
    }

    /// Long name when present, otherwise the name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.long_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("<unknown storey>")
    }
}
