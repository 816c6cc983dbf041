//! Shape evaluation: element → world-space vertices in meters.

use std::f64::consts::PI;

use nalgebra::{Matrix3, Matrix4, Point2, Point3};

use super::placement::{
    axis2_placement_2d, axis2_placement_3d, coordinates, direction, object_placement,
    transform_2d, transformation_operator,
};
use super::{body_items, Bounds};
use crate::error::GeometryError;
use crate::model::{IfcModel, Profile, ProfileShape};
use crate::parser::{StepEntity, StepValue};

/// Segments used to sample curved profile outlines.
const CURVE_SEGMENTS: usize = 32;
const MAX_ITEM_DEPTH: usize = 8;

/// Maps an element to the vertices of its body geometry.
pub trait ShapeEvaluator {
    /// World-space vertices in meters.
    fn vertices(&self, element: u64) -> Result<Vec<Point3<f64>>, GeometryError>;

    /// Axis-aligned bounds of [`ShapeEvaluator::vertices`].
    fn bounds(&self, element: u64) -> Result<Bounds, GeometryError> {
        let points = self.vertices(element)?;
        Bounds::from_points(&points).ok_or(GeometryError::Empty { id: element })
    }
}

/// Evaluates swept solids, faceted and tessellated solids, mapped items and
/// clipping results directly from the model, without a boolean kernel.
///
/// Extruded solids contribute the corners of their base and top outlines;
/// clipping is ignored, so bounds are conservative.
pub struct SolidEvaluator<'a> {
    model: &'a IfcModel,
    unit_scale: f64,
}

impl<'a> SolidEvaluator<'a> {
    #[must_use]
    pub fn new(model: &'a IfcModel, unit_scale: f64) -> Self {
        Self { model, unit_scale }
    }

    fn item_points(
        &self,
        item_id: u64,
        transform: &Matrix4<f64>,
        depth: usize,
        out: &mut Vec<Point3<f64>>,
    ) -> Result<(), GeometryError> {
        if depth > MAX_ITEM_DEPTH {
            return Err(malformed(item_id, "representation nesting too deep"));
        }
        let model = self.model;
        let item = model
            .entity(item_id)
            .ok_or_else(|| malformed(item_id, "missing representation item"))?;

        match item.entity_type.as_str() {
            "IFCEXTRUDEDAREASOLID" | "IFCEXTRUDEDAREASOLIDTAPERED" => {
                self.extrusion_points(item, transform, out)
            }
            "IFCFACETEDBREP" | "IFCFACETEDBREPWITHVOIDS" => {
                let shell = item
                    .reference(0)
                    .ok_or_else(|| malformed(item_id, "brep without outer shell"))?;
                self.shell_points(shell, transform, out)
            }
            "IFCPOLYGONALFACESET" | "IFCTRIANGULATEDFACESET" => {
                let list = item
                    .reference(0)
                    .and_then(|id| model.entity_of_type(id, "IFCCARTESIANPOINTLIST3D"))
                    .ok_or_else(|| malformed(item_id, "face set without coordinates"))?;
                out.extend(
                    point_list(list)
                        .iter()
                        .map(|p| transform.transform_point(p)),
                );
                Ok(())
            }
            "IFCMAPPEDITEM" => {
                let source = item
                    .reference(0)
                    .and_then(|id| model.entity_of_type(id, "IFCREPRESENTATIONMAP"))
                    .ok_or_else(|| malformed(item_id, "mapped item without source"))?;
                let origin = match source.reference(0) {
                    Some(id) => axis2_placement_3d(model, id)?,
                    None => Matrix4::identity(),
                };
                let target = match item.reference(1) {
                    Some(id) => transformation_operator(model, id)?,
                    None => Matrix4::identity(),
                };
                let mapped = transform * target * origin;
                let representation = source
                    .reference(1)
                    .and_then(|id| model.entity(id))
                    .ok_or_else(|| malformed(item_id, "mapped representation missing"))?;
                for nested in representation.references(3) {
                    self.item_points(nested, &mapped, depth + 1, out)?;
                }
                Ok(())
            }
            "IFCBOOLEANCLIPPINGRESULT" | "IFCBOOLEANRESULT" => {
                let first = item
                    .reference(1)
                    .ok_or_else(|| malformed(item_id, "boolean without first operand"))?;
                self.item_points(first, transform, depth + 1, out)
            }
            "IFCBOUNDINGBOX" => {
                let corner = item
                    .reference(0)
                    .map(|id| super::placement::cartesian_point(model, id))
                    .transpose()?
                    .unwrap_or_else(Point3::origin);
                let (dx, dy, dz) = (
                    item.real(1).unwrap_or(0.0),
                    item.real(2).unwrap_or(0.0),
                    item.real(3).unwrap_or(0.0),
                );
                for (i, j, k) in box_corners() {
                    let p = Point3::new(corner.x + i * dx, corner.y + j * dy, corner.z + k * dz);
                    out.push(transform.transform_point(&p));
                }
                Ok(())
            }
            other => {
                tracing::debug!(item_id, entity_type = other, "Skipping unsupported representation item");
                Ok(())
            }
        }
    }

    /// `IfcExtrudedAreaSolid(SweptArea, Position, ExtrudedDirection, Depth)`
    fn extrusion_points(
        &self,
        solid: &StepEntity,
        transform: &Matrix4<f64>,
        out: &mut Vec<Point3<f64>>,
    ) -> Result<(), GeometryError> {
        let model = self.model;
        let profile = solid
            .reference(0)
            .and_then(|id| Profile::decode(model, id))
            .ok_or_else(|| malformed(solid.id, "extrusion without profile"))?;
        let outline = profile_outline(model, &profile)?;

        let position = match solid.reference(1) {
            Some(id) => axis2_placement_3d(model, id)?,
            None => Matrix4::identity(),
        };
        let extrusion = match solid.reference(2) {
            Some(id) => direction(model, id)?.normalize(),
            None => nalgebra::Vector3::z(),
        };
        let depth = solid
            .real(3)
            .ok_or_else(|| malformed(solid.id, "extrusion without depth"))?;

        let placed = transform * position;
        for p in &outline {
            let base = Point3::new(p.x, p.y, 0.0);
            let top = base + extrusion * depth;
            out.push(placed.transform_point(&base));
            out.push(placed.transform_point(&top));
        }
        Ok(())
    }

    /// Closed shell → faces → bounds → poly loops → points.
    fn shell_points(
        &self,
        shell_id: u64,
        transform: &Matrix4<f64>,
        out: &mut Vec<Point3<f64>>,
    ) -> Result<(), GeometryError> {
        let model = self.model;
        let shell = model
            .entity(shell_id)
            .ok_or_else(|| malformed(shell_id, "missing shell"))?;

        for face in shell.references(0).into_iter().filter_map(|id| model.entity(id)) {
            for bound in face.references(0).into_iter().filter_map(|id| model.entity(id)) {
                let Some(polyloop) = bound
                    .reference(0)
                    .and_then(|id| model.entity_of_type(id, "IFCPOLYLOOP"))
                else {
                    continue;
                };
                for point in polyloop.references(0) {
                    let p = super::placement::cartesian_point(model, point)?;
                    out.push(transform.transform_point(&p));
                }
            }
        }
        Ok(())
    }
}

impl ShapeEvaluator for SolidEvaluator<'_> {
    fn vertices(&self, element: u64) -> Result<Vec<Point3<f64>>, GeometryError> {
        let model = self.model;
        let entity = model
            .entity(element)
            .ok_or_else(|| malformed(element, "missing element"))?;

        let world = match entity.reference(5) {
            Some(placement) => object_placement(model, placement)?,
            None => Matrix4::identity(),
        };
        let shape = entity
            .reference(6)
            .ok_or(GeometryError::NoRepresentation { id: element })?;

        let mut points = Vec::new();
        for item in body_items(model, shape) {
            self.item_points(item, &world, 0, &mut points)?;
        }

        if points.is_empty() {
            return Err(GeometryError::Empty { id: element });
        }
        Ok(points.into_iter().map(|p| p * self.unit_scale).collect())
    }
}

/// 2D outline of a profile in its own placement, model units.
pub fn profile_outline(model: &IfcModel, profile: &Profile) -> Result<Vec<Point2<f64>>, GeometryError> {
    let missing = || malformed(profile.id, "profile dimensions missing");

    let outline = match &profile.shape {
        ProfileShape::Rectangle { x_dim, y_dim }
        | ProfileShape::RoundedRectangle { x_dim, y_dim, .. }
        | ProfileShape::RectangleHollow { x_dim, y_dim, .. } => {
            rectangle(x_dim.ok_or_else(missing)?, y_dim.ok_or_else(missing)?)
        }
        ProfileShape::Flanged { width, depth, .. } | ProfileShape::Angle { width, depth, .. } => {
            rectangle(width.ok_or_else(missing)?, depth.ok_or_else(missing)?)
        }
        ProfileShape::Circle { radius } | ProfileShape::CircleHollow { radius, .. } => {
            let r = radius.ok_or_else(missing)?;
            ellipse(r, r)
        }
        ProfileShape::Ellipse {
            semi_axis1,
            semi_axis2,
        } => ellipse(semi_axis1.ok_or_else(missing)?, semi_axis2.ok_or_else(missing)?),
        ProfileShape::Arbitrary { outer_curve } => {
            curve_points(model, outer_curve.ok_or_else(missing)?)?
        }
        ProfileShape::Unsupported => {
            return Err(malformed(
                profile.id,
                &format!("unsupported profile {}", profile.entity_type),
            ))
        }
    };

    let position = match profile.position {
        Some(id) => axis2_placement_2d(model, id)?,
        None => Matrix3::identity(),
    };
    Ok(outline.iter().map(|p| transform_2d(&position, p)).collect())
}

/// Points of an `IfcPolyline` or `IfcIndexedPolyCurve`.
fn curve_points(model: &IfcModel, curve_id: u64) -> Result<Vec<Point2<f64>>, GeometryError> {
    let curve = model
        .entity(curve_id)
        .ok_or_else(|| malformed(curve_id, "missing curve"))?;

    let points: Vec<Point3<f64>> = match curve.entity_type.as_str() {
        "IFCPOLYLINE" => curve
            .references(0)
            .into_iter()
            .map(|id| super::placement::cartesian_point(model, id))
            .collect::<Result<_, _>>()?,
        "IFCINDEXEDPOLYCURVE" => curve
            .reference(0)
            .and_then(|id| model.entity_of_type(id, "IFCCARTESIANPOINTLIST2D"))
            .map(point_list)
            .unwrap_or_default(),
        other => return Err(malformed(curve_id, &format!("unsupported curve {other}"))),
    };

    if points.is_empty() {
        return Err(malformed(curve_id, "curve has no points"));
    }
    Ok(points.iter().map(|p| Point2::new(p.x, p.y)).collect())
}

/// Coordinates of an `IfcCartesianPointList2D`/`3D`.
fn point_list(list: &StepEntity) -> Vec<Point3<f64>> {
    list.attr(0)
        .and_then(StepValue::as_list)
        .map(|coords| {
            coords
                .iter()
                .filter_map(StepValue::as_list)
                .filter_map(coordinates)
                .collect()
        })
        .unwrap_or_default()
}

fn rectangle(x: f64, y: f64) -> Vec<Point2<f64>> {
    let (hx, hy) = (x / 2.0, y / 2.0);
    vec![
        Point2::new(-hx, -hy),
        Point2::new(hx, -hy),
        Point2::new(hx, hy),
        Point2::new(-hx, hy),
    ]
}

fn ellipse(a: f64, b: f64) -> Vec<Point2<f64>> {
    (0..CURVE_SEGMENTS)
        .map(|i| {
            let t = 2.0 * PI * i as f64 / CURVE_SEGMENTS as f64;
            Point2::new(a * t.cos(), b * t.sin())
        })
        .collect()
}

fn box_corners() -> impl Iterator<Item = (f64, f64, f64)> {
    (0..8u8).map(|i| {
        (
            f64::from(i & 1),
            f64::from((i >> 1) & 1),
            f64::from((i >> 2) & 1),
        )
    })
}

fn malformed(id: u64, message: &str) -> GeometryError {
    GeometryError::Malformed {
        id,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model_from_str;
    use approx::assert_relative_eq;

    fn model(body: &str) -> IfcModel {
        model_from_str(&format!("DATA;\n{body}\nENDSEC;"), "shape.ifc".to_string()).unwrap()
    }

    const PLACED_COLUMN: &str = "
        #1=IFCCARTESIANPOINT((5000.,2000.,-3000.));
        #2=IFCAXIS2PLACEMENT3D(#1,$,$);
        #3=IFCLOCALPLACEMENT($,#2);
        #4=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,300.,500.);
        #5=IFCDIRECTION((0.,0.,1.));
        #6=IFCEXTRUDEDAREASOLID(#4,$,#5,3000.);
        #7=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#6));
        #8=IFCPRODUCTDEFINITIONSHAPE($,$,(#7));
        #10=IFCCOLUMN('c',$,'C',$,$,#3,#8,$,$);";

    #[test]
    fn extruded_rectangle_bounds_in_meters() {
        let m = model(PLACED_COLUMN);
        let bounds = SolidEvaluator::new(&m, 1e-3).bounds(10).unwrap();
        assert_relative_eq!(bounds.extent_x(), 0.3, epsilon = 1e-9);
        assert_relative_eq!(bounds.extent_y(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(bounds.extent_z(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.min.z, -3.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.min.x, 4.85, epsilon = 1e-9);
    }

    #[test]
    fn triangulated_face_set_vertices() {
        let m = model(
            "#1=IFCCARTESIANPOINTLIST3D(((0.,0.,0.),(0.4,0.,0.),(0.4,0.4,0.),(0.,0.4,2.7)));
             #2=IFCTRIANGULATEDFACESET(#1,$,.T.,((1,2,3),(1,3,4)),$);
             #3=IFCSHAPEREPRESENTATION($,'Body','Tessellation',(#2));
             #4=IFCPRODUCTDEFINITIONSHAPE($,$,(#3));
             #10=IFCCOLUMN('c',$,'C',$,$,$,#4,$,$);",
        );
        let points = SolidEvaluator::new(&m, 1.0).vertices(10).unwrap();
        assert_eq!(points.len(), 4);
        let bounds = Bounds::from_points(&points).unwrap();
        assert_relative_eq!(bounds.extent_z(), 2.7, epsilon = 1e-9);
    }

    #[test]
    fn mapped_items_follow_their_source() {
        let m = model(
            "#1=IFCCIRCLEPROFILEDEF(.AREA.,$,$,200.);
             #2=IFCEXTRUDEDAREASOLID(#1,$,$,2500.);
             #3=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#2));
             #4=IFCCARTESIANPOINT((0.,0.,0.));
             #5=IFCAXIS2PLACEMENT3D(#4,$,$);
             #6=IFCREPRESENTATIONMAP(#5,#3);
             #7=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#4,1.,$);
             #8=IFCMAPPEDITEM(#6,#7);
             #9=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#8));
             #11=IFCPRODUCTDEFINITIONSHAPE($,$,(#9));
             #10=IFCCOLUMN('c',$,'C',$,$,$,#11,$,$);",
        );
        let bounds = SolidEvaluator::new(&m, 1e-3).bounds(10).unwrap();
        assert_relative_eq!(bounds.extent_x(), 0.4, epsilon = 1e-9);
        assert_relative_eq!(bounds.extent_z(), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn missing_representation_is_an_error() {
        let m = model("#10=IFCCOLUMN('c',$,'C',$,$,$,$,$,$);");
        assert!(matches!(
            SolidEvaluator::new(&m, 1.0).vertices(10),
            Err(GeometryError::NoRepresentation { id: 10 })
        ));
    }
}
