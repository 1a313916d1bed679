//! Octree backend over an indexed triangle mesh.

use nalgebra::{Matrix4, Point3, Vector3};

use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingSphere},
    parry3d::query::{PointQuery, Ray, RayCast},
    parry3d::shape::Triangle,
};
use crate::hit::{HitContext, HitResult};
use crate::octant::Octant;
use crate::octree::{OctreeBackend, box_disjoint_sphere};

/// Triangle-list geometry feeding a [`crate::StaticOctree`]. Items are
/// `(triangle index, bounding box)` pairs with the box computed once at
/// build time, so partitioning never re-derives triangle bounds.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    positions: Vec<Point3<Real>>,
    indices: Vec<u32>,
}

impl MeshGeometry {
    /// Wrap vertex positions and a triangle list (three indices per
    /// triangle; a trailing partial triple is ignored).
    pub fn new(positions: Vec<Point3<Real>>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn positions(&self) -> &[Point3<Real>] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn triangle(&self, tri: u32) -> Triangle {
        let base = tri as usize * 3;
        Triangle::new(
            self.positions[self.indices[base] as usize],
            self.positions[self.indices[base + 1] as usize],
            self.positions[self.indices[base + 2] as usize],
        )
    }
}

impl OctreeBackend for MeshGeometry {
    type Item = (u32, Aabb);

    fn collect_items(&self) -> Vec<Self::Item> {
        (0..self.triangle_count() as u32)
            .map(|tri| {
                let triangle = self.triangle(tri);
                let mins = triangle.a.coords.inf(&triangle.b.coords).inf(&triangle.c.coords);
                let maxs = triangle.a.coords.sup(&triangle.b.coords).sup(&triangle.c.coords);
                (tri, Aabb::new(mins.into(), maxs.into()))
            })
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
        item.1
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
        *is_intersect = octant.bound.intersects_local_ray(ray_model, Real::MAX);
        if !*is_intersect {
            return false;
        }
        let mut found = false;
        for (tri_index, tri_bound) in items {
            if !tri_bound.intersects_local_ray(ray_model, Real::MAX) {
                continue;
            }
            let triangle = self.triangle(*tri_index);
            let Some(intersection) =
                triangle.cast_local_ray_and_get_normal(ray_model, Real::MAX, true)
            else {
                continue;
            };
            let point = model_matrix.transform_point(&ray_model.point_at(intersection.time_of_impact));
            let distance = (point - context.ray.origin).norm();
            let result = HitResult {
                distance,
                point,
                normal: model_matrix.transform_vector(&intersection.normal).normalize(),
                item_index: *tri_index as usize,
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
        for (tri_index, tri_bound) in items {
            if box_disjoint_sphere(tri_bound, sphere) {
                continue;
            }
            let triangle = self.triangle(*tri_index);
            let projection = triangle.project_local_point(&sphere.center, true);
            let distance = (projection.point - sphere.center).norm();
            if distance <= sphere.radius
                && results.first().is_none_or(|best| distance < best.distance)
            {
                let normal = triangle
                    .normal()
                    .map_or_else(Vector3::zeros, |normal| normal.into_inner());
                results.clear();
                results.push(HitResult {
                    distance,
                    point: projection.point,
                    normal,
                    item_index: *tri_index as usize,
                });
                found = true;
            }
        }
        found
    }
}
