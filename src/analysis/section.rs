//! Plan dimensions and cross-section area of a column.
//!
//! Strategies, in order: the profile of the material profile set, the swept
//! area of the body geometry, and the horizontal bounding box of the
//! evaluated shape. Profile results with an implausible plan extent are
//! replaced by the bounding box.

use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

use crate::config::PLAUSIBLE_EDGE_M;
use crate::geometry::{body_items, representation_items, ShapeEvaluator};
use crate::model::{Column, FlangeKind, IfcModel, MaterialDef, Profile, ProfileShape};

const MAX_MAPPING_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionSource {
    MaterialProfile,
    SweptSolid,
    BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Closed-form area of a known profile.
    Exact,
    /// Width × height of the plan extent.
    Approximate,
}

impl fmt::Display for SectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionSource::MaterialProfile => "material-profile",
            SectionSource::SweptSolid => "swept-solid",
            SectionSource::BoundingBox => "bounding-box",
        })
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Precision::Exact => "exact",
            Precision::Approximate => "approximate",
        })
    }
}

/// Resolved plan dimensions, in meters. `width_m >= height_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SectionGeometry {
    pub width_m: f64,
    pub height_m: f64,
    pub area_m2: f64,
    pub precision: Precision,
    pub source: SectionSource,
}

impl SectionGeometry {
    fn new(a: f64, b: f64, area_m2: Option<f64>, source: SectionSource) -> Self {
        let (width_m, height_m) = if a >= b { (a, b) } else { (b, a) };
        let (area_m2, precision) = match area_m2 {
            Some(area) => (area, Precision::Exact),
            None => (width_m * height_m, Precision::Approximate),
        };
        Self {
            width_m,
            height_m,
            area_m2,
            precision,
            source,
        }
    }

    #[must_use]
    pub fn width_mm(&self) -> f64 {
        self.width_m * 1000.0
    }

    #[must_use]
    pub fn height_mm(&self) -> f64 {
        self.height_m * 1000.0
    }

    #[must_use]
    pub fn area_mm2(&self) -> f64 {
        self.area_m2 * 1e6
    }

    #[must_use]
    pub fn is_approximate(&self) -> bool {
        self.precision == Precision::Approximate
    }
}

/// Plan extent and optional closed-form area of a profile, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticSection {
    pub width_m: f64,
    pub height_m: f64,
    pub area_m2: Option<f64>,
}

/// Closed-form section of a parameterized profile. `None` for unsupported
/// profile types or missing plan dimensions.
#[must_use]
pub fn analytic_section(profile: &Profile, unit_scale: f64) -> Option<AnalyticSection> {
    let s = |v: Option<f64>| v.map(|v| v * unit_scale);

    let (width, height, area) = match profile.shape {
        ProfileShape::Rectangle { x_dim, y_dim } => {
            let (x, y) = (s(x_dim)?, s(y_dim)?);
            (x, y, Some(x * y))
        }
        ProfileShape::RoundedRectangle {
            x_dim,
            y_dim,
            rounding_radius,
        } => {
            let (x, y) = (s(x_dim)?, s(y_dim)?);
            let r = s(rounding_radius).unwrap_or(0.0);
            (x, y, Some(x * y - (4.0 - PI) * r * r))
        }
        // Net area: the outer rectangle minus the void.
        ProfileShape::RectangleHollow {
            x_dim,
            y_dim,
            wall_thickness,
        } => {
            let (x, y) = (s(x_dim)?, s(y_dim)?);
            let area = s(wall_thickness).map(|t| {
                let inner = (x - 2.0 * t).max(0.0) * (y - 2.0 * t).max(0.0);
                x * y - inner
            });
            (x, y, area)
        }
        ProfileShape::Circle { radius } => {
            let r = s(radius)?;
            (2.0 * r, 2.0 * r, Some(PI * r * r))
        }
        // Net area: the outer disc minus the void.
        ProfileShape::CircleHollow {
            radius,
            wall_thickness,
        } => {
            let r = s(radius)?;
            let area = s(wall_thickness).map(|t| {
                let inner = (r - t).max(0.0);
                PI * (r * r - inner * inner)
            });
            (2.0 * r, 2.0 * r, area)
        }
        ProfileShape::Ellipse {
            semi_axis1,
            semi_axis2,
        } => {
            let (a, b) = (s(semi_axis1)?, s(semi_axis2)?);
            (2.0 * a, 2.0 * b, Some(PI * a * b))
        }
        ProfileShape::Flanged {
            kind,
            width,
            depth,
            web_thickness,
            flange_thickness,
        } => {
            let (b, h) = (s(width)?, s(depth)?);
            let area = match (s(web_thickness), s(flange_thickness)) {
                (Some(tw), Some(tf)) => Some(match kind {
                    FlangeKind::T => b * tf + (h - tf) * tw,
                    FlangeKind::I | FlangeKind::U | FlangeKind::Z => {
                        2.0 * b * tf + (h - 2.0 * tf) * tw
                    }
                }),
                _ => None,
            };
            (b, h, area)
        }
        ProfileShape::Angle {
            depth,
            width,
            thickness,
        } => {
            let (b, h) = (s(width)?, s(depth)?);
            (b, h, s(thickness).map(|t| t * (h + b - t)))
        }
        ProfileShape::Arbitrary { .. } | ProfileShape::Unsupported => return None,
    };

    Some(AnalyticSection {
        width_m: width,
        height_m: height,
        area_m2: area,
    })
}

/// Profile of the first material profile carrying one, from the instance's
/// material associations, then from its type's.
#[must_use]
pub fn material_profile(model: &IfcModel, element: u64) -> Option<Profile> {
    let from_object = |object: u64| {
        model
            .material_associations(object)
            .iter()
            .filter_map(|id| MaterialDef::decode(model, *id))
            .filter_map(|def| def.resolve_usage(model))
            .find_map(|def| match def {
                MaterialDef::ProfileSet { items, .. } => items
                    .iter()
                    .filter_map(|item| item.profile)
                    .find_map(|id| Profile::decode(model, id)),
                _ => None,
            })
    };

    from_object(element).or_else(|| model.type_of(element).and_then(from_object))
}

/// Swept area of the first swept solid in the body geometry, then in the
/// representation maps of the element's type.
#[must_use]
pub fn swept_profile(model: &IfcModel, column: &Column) -> Option<Profile> {
    let from_items = |items: Vec<u64>| {
        items
            .into_iter()
            .find_map(|item| swept_area(model, item, 0))
    };

    column
        .representation
        .and_then(|shape| from_items(body_items(model, shape)))
        .or_else(|| {
            let element_type = model.entity(model.type_of(column.id)?)?;
            element_type
                .references(6)
                .into_iter()
                .filter_map(|map| mapped_representation(model, map))
                .find_map(|representation| {
                    let representation = model.entity(representation)?;
                    from_items(representation_items(&[representation]))
                })
        })
}

fn swept_area(model: &IfcModel, item_id: u64, depth: usize) -> Option<Profile> {
    if depth > MAX_MAPPING_DEPTH {
        return None;
    }
    let item = model.entity(item_id)?;
    match item.entity_type.as_str() {
        "IFCEXTRUDEDAREASOLID"
        | "IFCEXTRUDEDAREASOLIDTAPERED"
        | "IFCFIXEDREFERENCESWEPTAREASOLID" => Profile::decode(model, item.reference(0)?),
        "IFCMAPPEDITEM" => {
            let representation = model.entity(mapped_representation(model, item.reference(0)?)?)?;
            representation
                .references(3)
                .into_iter()
                .find_map(|nested| swept_area(model, nested, depth + 1))
        }
        "IFCBOOLEANCLIPPINGRESULT" | "IFCBOOLEANRESULT" => {
            swept_area(model, item.reference(1)?, depth + 1)
        }
        _ => None,
    }
}

/// `IfcRepresentationMap.MappedRepresentation`
fn mapped_representation(model: &IfcModel, map: u64) -> Option<u64> {
    model
        .entity_of_type(map, "IFCREPRESENTATIONMAP")
        .and_then(|m| m.reference(1))
}

/// Horizontal extent of the evaluated shape, in meters.
#[must_use]
pub fn plan_extent(evaluator: &dyn ShapeEvaluator, element: u64) -> Option<(f64, f64)> {
    match evaluator.bounds(element) {
        Ok(bounds) => Some((bounds.extent_x(), bounds.extent_y())),
        Err(err) => {
            tracing::debug!(element, error = %err, "Shape evaluation failed");
            None
        }
    }
}

/// Resolves the section of a column through the profile and bounding-box
/// strategies.
#[must_use]
pub fn resolve_section(
    model: &IfcModel,
    column: &Column,
    unit_scale: f64,
    evaluator: &dyn ShapeEvaluator,
) -> Option<SectionGeometry> {
    let strategies: [(SectionSource, &dyn Fn() -> Option<Profile>); 2] = [
        (SectionSource::MaterialProfile, &|| {
            material_profile(model, column.id)
        }),
        (SectionSource::SweptSolid, &|| swept_profile(model, column)),
    ];

    let analytic = strategies.iter().find_map(|(source, strategy)| {
        let profile = strategy()?;
        let section = analytic_section(&profile, unit_scale);
        if section.is_none() {
            tracing::debug!(
                column = column.id,
                profile = %profile.entity_type,
                "No closed form for profile"
            );
        }
        section.map(|s| (*source, s))
    });

    let bounding_box = || {
        plan_extent(evaluator, column.id)
            .map(|(x, y)| SectionGeometry::new(x, y, None, SectionSource::BoundingBox))
    };

    match analytic {
        Some((source, section)) => {
            let profile_section =
                SectionGeometry::new(section.width_m, section.height_m, section.area_m2, source);
            if profile_section.width_m > PLAUSIBLE_EDGE_M {
                tracing::debug!(
                    column = column.id,
                    width_m = profile_section.width_m,
                    "Implausible profile extent, using bounding box"
                );
                return Some(bounding_box().unwrap_or(profile_section));
            }
            Some(profile_section)
        }
        None => {
            tracing::debug!(column = column.id, "No profile, using bounding box");
            bounding_box()
        }
    }
}
