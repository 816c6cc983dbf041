//! Placement and transform parsing.
//!
//! All matrices map local coordinates to the parent frame, in model length
//! units.

use std::collections::HashSet;

use nalgebra::{Matrix3, Matrix4, Point2, Point3, Vector3};

use crate::error::GeometryError;
use crate::model::IfcModel;
use crate::parser::StepValue;

const MAX_PLACEMENT_DEPTH: usize = 64;

/// Resolves an `IfcLocalPlacement` chain into one object-to-world matrix.
///
/// Placement types other than `IfcLocalPlacement` (grid placements, linear
/// placements) contribute an identity transform.
pub fn object_placement(model: &IfcModel, placement: u64) -> Result<Matrix4<f64>, GeometryError> {
    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(placement);

    while let Some(id) = current {
        if !visited.insert(id) || chain.len() >= MAX_PLACEMENT_DEPTH {
            return Err(malformed(id, "cyclic placement chain"));
        }
        let entity = model
            .entity(id)
            .ok_or_else(|| malformed(id, "missing placement"))?;
        if !entity.is("IFCLOCALPLACEMENT") {
            tracing::debug!(id, entity_type = %entity.entity_type, "Unsupported placement, using identity");
            break;
        }
        let relative = match entity.reference(1) {
            Some(axis) => axis2_placement_3d(model, axis)?,
            None => Matrix4::identity(),
        };
        chain.push(relative);
        current = entity.reference(0);
    }

    // Outermost placement first.
    Ok(chain
        .iter()
        .rev()
        .fold(Matrix4::identity(), |acc, local| acc * local))
}

/// `IfcAxis2Placement3D(Location, Axis, RefDirection)`
pub fn axis2_placement_3d(model: &IfcModel, id: u64) -> Result<Matrix4<f64>, GeometryError> {
    let placement = model
        .entity(id)
        .ok_or_else(|| malformed(id, "missing axis placement"))?;
    if placement.is("IFCAXIS2PLACEMENT2D") {
        let m = axis2_placement_2d(model, id)?;
        return Ok(lift_2d(&m));
    }
    if !placement.is("IFCAXIS2PLACEMENT3D") {
        return Err(malformed(id, "expected IfcAxis2Placement3D"));
    }

    let location = match placement.reference(0) {
        Some(point) => cartesian_point(model, point)?,
        None => Point3::origin(),
    };
    let z_axis = optional_direction(model, placement.reference(1), Vector3::z())?;
    let x_axis = optional_direction(model, placement.reference(2), Vector3::x())?;

    let z = z_axis.normalize();
    let x_projected = x_axis.normalize() - z * x_axis.normalize().dot(&z);
    let x = if x_projected.norm() > 1e-6 {
        x_projected.normalize()
    } else if z.z.abs() < 0.9 {
        Vector3::z().cross(&z).normalize()
    } else {
        Vector3::x().cross(&z).normalize()
    };
    let y = z.cross(&x).normalize();

    Ok(frame(&x, &y, &z, &location.coords))
}

/// `IfcAxis2Placement2D(Location, RefDirection)` as a homogeneous 3×3 matrix.
pub fn axis2_placement_2d(model: &IfcModel, id: u64) -> Result<Matrix3<f64>, GeometryError> {
    let placement = model
        .entity_of_type(id, "IFCAXIS2PLACEMENT2D")
        .ok_or_else(|| malformed(id, "expected IfcAxis2Placement2D"))?;

    let location = match placement.reference(0) {
        Some(point) => cartesian_point(model, point)?,
        None => Point3::origin(),
    };
    let x = optional_direction(model, placement.reference(1), Vector3::x())?;
    let (cx, cy) = {
        let n = (x.x * x.x + x.y * x.y).sqrt();
        if n > 1e-12 {
            (x.x / n, x.y / n)
        } else {
            (1.0, 0.0)
        }
    };

    Ok(Matrix3::new(
        cx, -cy, location.x, //
        cy, cx, location.y, //
        0.0, 0.0, 1.0,
    ))
}

/// `IfcCartesianTransformationOperator3D` and its non-uniform subtype.
///
/// Attributes: Axis1, Axis2, LocalOrigin, Scale, Axis3, [Scale2, Scale3].
pub fn transformation_operator(model: &IfcModel, id: u64) -> Result<Matrix4<f64>, GeometryError> {
    let operator = model
        .entity(id)
        .ok_or_else(|| malformed(id, "missing transformation operator"))?;
    if !operator.entity_type.starts_with("IFCCARTESIANTRANSFORMATIONOPERATOR") {
        return Err(malformed(id, "expected IfcCartesianTransformationOperator"));
    }

    let x = optional_direction(model, operator.reference(0), Vector3::x())?.normalize();
    let z = optional_direction(model, operator.reference(4), Vector3::z())?.normalize();
    let y_hint = optional_direction(model, operator.reference(1), z.cross(&x))?;
    let y = if y_hint.norm() > 1e-12 {
        y_hint.normalize()
    } else {
        Vector3::y()
    };
    let origin = match operator.reference(2) {
        Some(point) => cartesian_point(model, point)?,
        None => Point3::origin(),
    };
    let scale = operator.real(3).unwrap_or(1.0);
    let scale_y = operator.real(5).unwrap_or(scale);
    let scale_z = operator.real(6).unwrap_or(scale);

    Ok(frame(&(x * scale), &(y * scale_y), &(z * scale_z), &origin.coords))
}

/// `IfcCartesianPoint`; 2D points get z = 0.
pub fn cartesian_point(model: &IfcModel, id: u64) -> Result<Point3<f64>, GeometryError> {
    let point = model
        .entity_of_type(id, "IFCCARTESIANPOINT")
        .ok_or_else(|| malformed(id, "expected IfcCartesianPoint"))?;
    let coords = point
        .attr(0)
        .and_then(StepValue::as_list)
        .ok_or_else(|| malformed(id, "missing coordinates"))?;
    coordinates(coords).ok_or_else(|| malformed(id, "invalid coordinates"))
}

/// Reads `(x, y[, z])` from a coordinate list.
#[must_use]
pub fn coordinates(values: &[StepValue]) -> Option<Point3<f64>> {
    let x = values.first()?.as_real()?;
    let y = values.get(1)?.as_real()?;
    let z = values.get(2).and_then(StepValue::as_real).unwrap_or(0.0);
    Some(Point3::new(x, y, z))
}

pub fn direction(model: &IfcModel, id: u64) -> Result<Vector3<f64>, GeometryError> {
    let dir = model
        .entity_of_type(id, "IFCDIRECTION")
        .ok_or_else(|| malformed(id, "expected IfcDirection"))?;
    let ratios = dir
        .attr(0)
        .and_then(StepValue::as_list)
        .and_then(coordinates)
        .ok_or_else(|| malformed(id, "invalid direction ratios"))?;
    let v = ratios.coords;
    if v.norm() < 1e-12 {
        return Err(malformed(id, "zero-length direction"));
    }
    Ok(v)
}

/// Applies a homogeneous 2D transform to a profile point.
#[must_use]
pub fn transform_2d(m: &Matrix3<f64>, p: &Point2<f64>) -> Point2<f64> {
    m.transform_point(p)
}

fn optional_direction(
    model: &IfcModel,
    id: Option<u64>,
    default: Vector3<f64>,
) -> Result<Vector3<f64>, GeometryError> {
    match id {
        Some(id) => direction(model, id),
        None => Ok(default),
    }
}

fn frame(x: &Vector3<f64>, y: &Vector3<f64>, z: &Vector3<f64>, t: &Vector3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        x.x, y.x, z.x, t.x, //
        x.y, y.y, z.y, t.y, //
        x.z, y.z, z.z, t.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

fn lift_2d(m: &Matrix3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        m[(0, 0)], m[(0, 1)], 0.0, m[(0, 2)], //
        m[(1, 0)], m[(1, 1)], 0.0, m[(1, 2)], //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
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
        model_from_str(&format!("DATA;\n{body}\nENDSEC;"), "placement.ifc".to_string()).unwrap()
    }

    #[test]
    fn nested_local_placements_compose() {
        let m = model(
            "#1=IFCCARTESIANPOINT((1000.,0.,0.));
             #2=IFCAXIS2PLACEMENT3D(#1,$,$);
             #3=IFCLOCALPLACEMENT($,#2);
             #4=IFCCARTESIANPOINT((0.,500.,3000.));
             #5=IFCDIRECTION((0.,1.,0.));
             #6=IFCDIRECTION((0.,0.,1.));
             #7=IFCAXIS2PLACEMENT3D(#4,#6,#5);
             #8=IFCLOCALPLACEMENT(#3,#7);",
        );
        let world = object_placement(&m, 8).unwrap();
        let p = world.transform_point(&Point3::new(100.0, 0.0, 0.0));
        // Local x is rotated onto world y.
        assert_relative_eq!(p.x, 1000.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 600.0, epsilon = 1e-9);
        assert_relative_eq!(p.z, 3000.0, epsilon = 1e-9);
    }

    #[test]
    fn cyclic_placements_are_rejected() {
        let m = model(
            "#1=IFCLOCALPLACEMENT(#2,$);
             #2=IFCLOCALPLACEMENT(#1,$);",
        );
        assert!(object_placement(&m, 1).is_err());
    }

    #[test]
    fn profile_position_rotates_in_plane() {
        let m = model(
            "#1=IFCCARTESIANPOINT((10.,20.));
             #2=IFCDIRECTION((0.,1.));
             #3=IFCAXIS2PLACEMENT2D(#1,#2);",
        );
        let t = axis2_placement_2d(&m, 3).unwrap();
        let p = transform_2d(&t, &Point2::new(1.0, 0.0));
        assert_relative_eq!(p.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 21.0, epsilon = 1e-9);
    }
}
