//! Lightweight geometry: placements, shape vertices and bounds.

pub mod evaluator;
pub mod placement;

use nalgebra::Point3;

use crate::model::IfcModel;
use crate::parser::StepEntity;

pub use evaluator::{ShapeEvaluator, SolidEvaluator};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// `None` for an empty point set.
    #[must_use]
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for p in rest {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    #[must_use]
    pub fn extent_x(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn extent_y(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn extent_z(&self) -> f64 {
        self.max.z - self.min.z
    }
}

/// Items of the body representations of an `IfcProductDefinitionShape`.
///
/// Representations identified as `Body` are preferred; when none is
/// identified that way, the items of every representation are returned.
#[must_use]
pub fn body_items(model: &IfcModel, product_shape: u64) -> Vec<u64> {
    let Some(shape) = model.entity(product_shape) else {
        return Vec::new();
    };
    let representations: Vec<_> = shape
        .references(2)
        .into_iter()
        .filter_map(|id| model.entity(id))
        .collect();
    representation_items(&representations)
}

/// Same preference as [`body_items`], over a list of shape representations.
#[must_use]
pub fn representation_items(representations: &[&StepEntity]) -> Vec<u64> {
    let is_body = |r: &StepEntity| {
        r.string(1)
            .is_some_and(|identifier| identifier.eq_ignore_ascii_case("Body"))
    };

    let any_body = representations.iter().any(|r| is_body(r));
    representations
        .iter()
        .filter(|r| !any_body || is_body(r))
        .flat_map(|r| r.references(3))
        .collect()
}
