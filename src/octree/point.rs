//! Octree backend over an unstructured point cloud.

use nalgebra::{Matrix4, Point3, Vector3};

use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingSphere, BoundingVolume},
    parry3d::query::{Ray, RayCast},
};
use crate::hit::{HitContext, HitResult};
use crate::octant::Octant;
use crate::octree::{OctreeBackend, box_disjoint_sphere};

/// Point positions feeding a [`crate::StaticOctree`]. Items are
/// `(point index, position)` pairs; each item's bound is the degenerate
/// box at its position.
///
/// Ray picking treats a point as hit when it lies within the context's
/// `hit_thickness` of the ray, so pick queries against clouds should set
/// a non-zero thickness.
#[derive(Debug, Clone)]
pub struct PointGeometry {
    positions: Vec<Point3<Real>>,
}

impl PointGeometry {
    pub fn new(positions: Vec<Point3<Real>>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[Point3<Real>] {
        &self.positions
    }
}

impl OctreeBackend for PointGeometry {
    type Item = (u32, Point3<Real>);

    fn collect_items(&self) -> Vec<Self::Item> {
        self.positions
            .iter()
            .enumerate()
            .map(|(index, position)| (index as u32, *position))
            .collect()
    }

    fn max_bound(&self) -> Aabb {
        let Some(first) = self.positions.first() else {
            return Aabb::new(Point3::origin(), Point3::origin());
        };
        let mut mins = first.coords;
        let mut maxs = first.coords;
        for position in &self.positions[1..] {
            mins = mins.inf(&position.coords);
            maxs = maxs.sup(&position.coords);
        }
        Aabb::new(mins.into(), maxs.into())
    }

    fn item_bound(&self, item: &Self::Item) -> Aabb {
        Aabb::new(item.1, item.1)
    }

    fn hit_test_node(
        &self,
        octant: &Octant,
        items: &[Self::Item],
        context: &HitContext,
        model_matrix: &Matrix4<Real>,
        ray_model: &Ray,
        return_all: bool,
        hits: &mut Vec<HitResult>,
        is_intersect: &mut bool,
    ) -> bool {
        let thickness = context.hit_thickness;
        // Loosen the bound by the pick tolerance so near-boundary points
        // are not pruned away with their node.
        *is_intersect = octant
            .bound
            .loosened(thickness)
            .intersects_local_ray(ray_model, Real::MAX);
        if !*is_intersect {
            return false;
        }
        let mut found = false;
        for (point_index, position) in items {
            let along = (position - ray_model.origin).dot(&ray_model.dir);
            if along < 0.0 {
                continue;
            }
            if (position - ray_model.point_at(along)).norm() > thickness {
                continue;
            }
            let point = model_matrix.transform_point(position);
            let distance = (point - context.ray.origin).norm();
            let result = HitResult {
                distance,
                point,
                normal: Vector3::zeros(),
                item_index: *point_index as usize,
            };
            if return_all {
                hits.push(result);
                found = true;
            } else if hits.first().is_none_or(|best| distance < best.distance) {
                hits.clear();
                hits.push(result);
                found = true;
            }
        }
        found
    }

    fn nearest_node_by_sphere(
        &self,
        octant: &Octant,
        items: &[Self::Item],
        sphere: &BoundingSphere,
        results: &mut Vec<HitResult>,
        is_intersect: &mut bool,
    ) -> bool {
        *is_intersect = !box_disjoint_sphere(&octant.bound, sphere);
        if !*is_intersect {
            return false;
        }
        let mut found = false;
        for (point_index, position) in items {
            let distance = (position - sphere.center).norm();
            if distance <= sphere.radius
                && results.first().is_none_or(|best| distance < best.distance)
            {
                results.clear();
                results.push(HitResult {
                    distance,
                    point: *position,
                    normal: Vector3::zeros(),
                    item_index: *point_index as usize,
                });
                found = true;
            }
        }
        found
    }
}
