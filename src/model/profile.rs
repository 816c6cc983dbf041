//! Cross-section profile definitions (`IfcProfileDef` family).

use super::IfcModel;
use crate::parser::StepEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlangeKind {
    I,
    T,
    U,
    Z,
}

/// Dimensions are in model length units. Zero or negative values are
/// decoded as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileShape {
    Rectangle {
        x_dim: Option<f64>,
        y_dim: Option<f64>,
    },
    RoundedRectangle {
        x_dim: Option<f64>,
        y_dim: Option<f64>,
        rounding_radius: Option<f64>,
    },
    RectangleHollow {
        x_dim: Option<f64>,
        y_dim: Option<f64>,
        wall_thickness: Option<f64>,
    },
    Circle {
        radius: Option<f64>,
    },
    CircleHollow {
        radius: Option<f64>,
        wall_thickness: Option<f64>,
    },
    Ellipse {
        semi_axis1: Option<f64>,
        semi_axis2: Option<f64>,
    },
    Flanged {
        kind: FlangeKind,
        width: Option<f64>,
        depth: Option<f64>,
        web_thickness: Option<f64>,
        flange_thickness: Option<f64>,
    },
    /// Equal legs when `width` is absent.
    Angle {
        depth: Option<f64>,
        width: Option<f64>,
        thickness: Option<f64>,
    },
    /// `IfcArbitraryClosedProfileDef`: only an outline curve.
    Arbitrary {
        outer_curve: Option<u64>,
    },
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: u64,
    pub entity_type: String,
    /// `IfcAxis2Placement2D` of parameterized profiles.
    pub position: Option<u64>,
    pub shape: ProfileShape,
}

impl Profile {
    /// Decodes any entity whose type name ends in `PROFILEDEF`.
    #[must_use]
    pub fn decode(model: &IfcModel, id: u64) -> Option<Self> {
        let entity = model.entity(id)?;
        if !entity.entity_type.ends_with("PROFILEDEF") {
            return None;
        }
        Some(Self::from_entity(entity))
    }

    #[must_use]
    pub fn from_entity(entity: &StepEntity) -> Self {
        let dim = |index: usize| entity.real(index).filter(|v| *v > 0.0);

        let shape = match entity.entity_type.as_str() {
            "IFCRECTANGLEPROFILEDEF" => ProfileShape::Rectangle {
                x_dim: dim(3),
                y_dim: dim(4),
            },
            "IFCROUNDEDRECTANGLEPROFILEDEF" => ProfileShape::RoundedRectangle {
                x_dim: dim(3),
                y_dim: dim(4),
                rounding_radius: dim(5),
            },
            "IFCRECTANGLEHOLLOWPROFILEDEF" => ProfileShape::RectangleHollow {
                x_dim: dim(3),
                y_dim: dim(4),
                wall_thickness: dim(5),
            },
            "IFCCIRCLEPROFILEDEF" => ProfileShape::Circle { radius: dim(3) },
            "IFCCIRCLEHOLLOWPROFILEDEF" => ProfileShape::CircleHollow {
                radius: dim(3),
                wall_thickness: dim(4),
            },
            "IFCELLIPSEPROFILEDEF" => ProfileShape::Ellipse {
                semi_axis1: dim(3),
                semi_axis2: dim(4),
            },
            "IFCISHAPEPROFILEDEF" => ProfileShape::Flanged {
                kind: FlangeKind::I,
                width: dim(3),
                depth: dim(4),
                web_thickness: dim(5),
                flange_thickness: dim(6),
            },
            "IFCTSHAPEPROFILEDEF" | "IFCUSHAPEPROFILEDEF" | "IFCZSHAPEPROFILEDEF" => {
                let kind = match entity.entity_type.as_str() {
                    "IFCTSHAPEPROFILEDEF" => FlangeKind::T,
                    "IFCUSHAPEPROFILEDEF" => FlangeKind::U,
                    _ => FlangeKind::Z,
                };
                ProfileShape::Flanged {
                    kind,
                    depth: dim(3),
                    width: dim(4),
                    web_thickness: dim(5),
                    flange_thickness: dim(6),
                }
            }
            "IFCLSHAPEPROFILEDEF" => ProfileShape::Angle {
                depth: dim(3),
                width: dim(4).or(dim(3)),
                thickness: dim(5),
            },
            "IFCARBITRARYCLOSEDPROFILEDEF" | "IFCARBITRARYPROFILEDEFWITHVOIDS" => {
                ProfileShape::Arbitrary {
                    outer_curve: entity.reference(2),
                }
            }
            _ => ProfileShape::Unsupported,
        };

        let position = match shape {
            ProfileShape::Arbitrary { .. } => None,
            _ => entity.reference(2),
        };

        Self {
            id: entity.id,
            entity_type: entity.entity_type.clone(),
            position,
            shape,
        }
    }
}
