use serde::Serialize;

use crate::parser::StepEntity;

/// Entity types treated as structural columns.
pub const COLUMN_TYPES: &[&str] = &["IFCCOLUMN", "IFCCOLUMNSTANDARDCASE"];

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub id: u64,
    pub global_id: String,
    pub name: String,
    pub placement: Option<u64>,
    pub representation: Option<u64>,
}

impl Column {
    #[must_use]
    pub fn from_entity(entity: &StepEntity) -> Self {
        Self {
            id: entity.id,
            global_id: entity.string(0).unwrap_or_default().to_string(),
            name: entity.string(2).unwrap_or_default().to_string(),
            placement: entity.reference(5),
            representation: entity.reference(6),
        }
    }

    /// Dimension text encoded after the last `:` of the name, e.g.
    /// `"Concrete-Rectangular-Column:400 x 400mm"` gives `"400 x 400mm"`.
    #[must_use]
    pub fn dimension_label(&self) -> Option<&str> {
        self.name
            .rsplit_once(':')
            .map(|(_, dim)| dim.trim())
            .filter(|dim| !dim.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str) -> Column {
        Column {
            id: 1,
            global_id: "g".to_string(),
            name: name.to_string(),
            placement: None,
            representation: None,
        }
    }

    #[test]
    fn dimension_label_uses_last_segment() {
        assert_eq!(
            column("Concrete-Rectangular-Column:C30:400 x 400mm").dimension_label(),
            Some("400 x 400mm")
        );
        assert_eq!(column("Wood column").dimension_label(), None);
        assert_eq!(column("Column: ").dimension_label(), None);
    }
}
