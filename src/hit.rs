//! Query inputs and outputs shared by every octree flavor.

use crate::float_types::{Real, parry3d::query::Ray};
use nalgebra::{Point3, Vector3};

/// World-space description of a pick query.
#[derive(Debug, Clone, Copy)]
pub struct HitContext {
    /// The query ray in world space.
    pub ray: Ray,
    /// Pick tolerance for zero-extent geometry (points); a point hits when
    /// its distance to the ray is at most this value.
    pub hit_thickness: Real,
}

impl HitContext {
    /// Build a context from a ray origin and direction. The direction is
    /// normalized here so per-node tests can treat the ray parameter as a
    /// distance.
    pub fn new(origin: Point3<Real>, direction: Vector3<Real>) -> Self {
        Self {
            ray: Ray::new(origin, direction.normalize()),
            hit_thickness: 0.0,
        }
    }

    /// Set the pick tolerance used by point octrees.
    pub const fn with_hit_thickness(mut self, hit_thickness: Real) -> Self {
        self.hit_thickness = hit_thickness;
        self
    }
}

/// One hit produced by a ray or nearest-point query, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Distance from the query origin (ray origin or search center).
    pub distance: Real,
    /// Hit location.
    pub point: Point3<Real>,
    /// Surface normal at the hit; zero for point geometry.
    pub normal: Vector3<Real>,
    /// Index of the hit element in the source geometry (triangle index for
    /// meshes, point index for clouds).
    pub item_index: usize,
}
