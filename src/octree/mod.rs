//! Static array-based octree: bulk build, ray hit-testing, nearest-point
//! queries.
//!
//! The tree is built once over a snapshot of items, partitioning the item
//! array in place so each node owns a contiguous `[start, end)` range.
//! Items that do not fit entirely inside any child bound stay with their
//! parent, so queries always test the visited node's retained range in
//! addition to descending. All walks are iterative ([`crate::traversal`])
//! and borrow their scratch stack from a shared pool ([`crate::pool`]).

use std::time::Instant;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::errors::OctreeError;
use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingSphere, BoundingVolume},
    parry3d::query::Ray,
};
use crate::hit::{HitContext, HitResult};
use crate::line_builder::{LineBuilder, LineGeometry};
use crate::octant::{Octant, OctantArray, OctantId};
use crate::pool::hit_stack_pool;
use crate::traversal::{traverse, traverse_mut};

pub mod mesh;
pub mod point;

/// Knobs controlling subdivision and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeBuildParameter {
    /// Nodes whose bound is smaller than this in every dimension are not
    /// split further.
    pub minimum_octant_size: Real,
    /// Nodes owning this many items or fewer are kept as leaves.
    pub min_object_size_to_split: usize,
    /// Expand the maximal bound into a cube before building.
    pub cubify: bool,
    /// Capture the ancestor bound chain of every hit-contributing node
    /// during [`StaticOctree::hit_test`], for diagnostics.
    pub record_hit_path_bounding_boxes: bool,
}

impl Default for OctreeBuildParameter {
    fn default() -> Self {
        Self {
            minimum_octant_size: 1.0,
            min_object_size_to_split: 2,
            cubify: false,
            record_hit_path_bounding_boxes: false,
        }
    }
}

/// Extension points a concrete octree supplies: where items come from,
/// how they bound, and how a single node's retained items answer ray and
/// sphere queries.
pub trait OctreeBackend {
    /// Geometry-derived element stored in the shared item array. Items are
    /// permuted in place during the build.
    type Item;

    /// Snapshot of the items the tree is built over.
    fn collect_items(&self) -> Vec<Self::Item>;

    /// Maximal bound enclosing every item.
    fn max_bound(&self) -> Aabb;

    /// Bounding box of one item.
    fn item_bound(&self, item: &Self::Item) -> Aabb;

    /// Whether `item` belongs entirely inside `node_bound`. Containment of
    /// the item's box is the membership test; overlap is not enough.
    fn item_fits(&self, node_bound: &Aabb, item_bound: &Aabb, _item: &Self::Item) -> bool {
        node_bound.contains(item_bound)
    }

    /// Ray-test the items retained at `octant` (children excluded).
    ///
    /// `items` is the node's retained slice, `ray_model` the query ray
    /// already transformed into model space. Sets `is_intersect` to whether
    /// the ray touches the node's bound at all (this gates descent into the
    /// subtree). Returns whether `hits` was extended or improved. When
    /// `return_all` is false the implementation keeps `hits` to the single
    /// closest result.
    #[allow(clippy::too_many_arguments)]
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
    ) -> bool;

    /// Sphere-test the items retained at `octant` (children excluded),
    /// keeping `results` to the single best candidate within the sphere.
    /// Sets `is_intersect` to whether the sphere touches the node's bound.
    fn nearest_node_by_sphere(
        &self,
        octant: &Octant,
        items: &[Self::Item],
        sphere: &BoundingSphere,
        results: &mut Vec<HitResult>,
        is_intersect: &mut bool,
    ) -> bool;
}

/// An immutable-once-built octree over the items of backend `B`.
pub struct StaticOctree<B: OctreeBackend> {
    backend: B,
    parameter: OctreeBuildParameter,
    octants: Option<OctantArray>,
    objects: Vec<B::Item>,
    tree_built: bool,
    bound: Aabb,
    hit_path_bounding_boxes: Vec<Aabb>,
}

impl<B: OctreeBackend> StaticOctree<B> {
    /// Create an unbuilt tree. Call [`Self::build_tree`] before querying.
    pub fn new(backend: B, parameter: OctreeBuildParameter) -> Self {
        Self {
            backend,
            parameter,
            octants: None,
            objects: Vec::new(),
            tree_built: false,
            bound: Aabb::new_invalid(),
            hit_path_bounding_boxes: Vec::new(),
        }
    }

    /// Build the tree. Idempotent: once built, further calls return `Ok`
    /// without touching anything.
    ///
    /// On arena exhaustion the affected nodes are kept as leaves holding
    /// their items and [`OctreeError::CapacityExceeded`] is returned; the
    /// tree is still complete and queryable.
    pub fn build_tree(&mut self) -> Result<(), OctreeError> {
        if self.tree_built {
            return Ok(());
        }
        let started = Instant::now();
        let mut objects = self.backend.collect_items();
        let mut bound = self.backend.max_bound();
        if self.parameter.cubify {
            bound = cubify(&bound);
        }
        let mut octants = OctantArray::with_root(bound, objects.len());
        let mut capacity_error = false;
        {
            let backend = &self.backend;
            let parameter = self.parameter;
            let mut stack = Vec::new();
            traverse_mut(&mut octants, &mut stack, |arena, id| {
                if !build_subtree(arena, id, &mut objects, backend, &parameter) {
                    capacity_error = true;
                }
                true
            });
        }
        octants.compact();
        self.bound = octants[OctantId::ROOT].bound;
        log::debug!(
            "static octree built: {} octants over {} items in {:?}",
            octants.len(),
            objects.len(),
            started.elapsed()
        );
        self.objects = objects;
        self.octants = Some(octants);
        self.tree_built = true;
        if capacity_error {
            Err(OctreeError::CapacityExceeded)
        } else {
            Ok(())
        }
    }

    /// Cast the context's world-space ray against the tree under
    /// `model_matrix`, returning world-space hits.
    ///
    /// With `return_all` set every intersected item is reported; otherwise
    /// only the closest. A non-invertible `model_matrix` means the ray
    /// cannot be expressed in model space, and yields no hits. An unbuilt
    /// or empty tree also yields no hits.
    pub fn hit_test(
        &mut self,
        context: &HitContext,
        model_matrix: &Matrix4<Real>,
        return_all: bool,
    ) -> Vec<HitResult> {
        let mut hits = Vec::new();
        self.hit_path_bounding_boxes.clear();
        let Some(octants) = self.octants.as_ref() else {
            return hits;
        };
        let Some(model_inv) = model_matrix.try_inverse() else {
            return hits;
        };
        // Transform the ray into model space once, not per node.
        let origin = model_inv.transform_point(&context.ray.origin);
        let direction = model_inv.transform_vector(&context.ray.dir).normalize();
        let ray_model = Ray::new(origin, direction);

        let record_path = self.parameter.record_hit_path_bounding_boxes;
        let backend = &self.backend;
        let objects = &self.objects;
        let hit_path = &mut self.hit_path_bounding_boxes;
        let mut is_hit = false;
        let mut stack = hit_stack_pool().acquire();
        traverse(octants, &mut stack, |octant| {
            let mut is_intersect = false;
            let node_hit = backend.hit_test_node(
                octant,
                &objects[octant.start..octant.end],
                context,
                model_matrix,
                &ray_model,
                return_all,
                &mut hits,
                &mut is_intersect,
            );
            is_hit |= node_hit;
            if record_path && node_hit {
                let mut node = octant;
                loop {
                    hit_path.push(node.bound);
                    if node.parent.is_none() {
                        break;
                    }
                    node = &octants[node.parent];
                }
            }
            is_intersect
        });
        if !is_hit {
            hits.clear();
            hit_path.clear();
        }
        hits
    }

    /// Report the best candidate within a fixed-radius sphere, in model
    /// space. Empty when nothing lies inside the sphere.
    pub fn find_nearest_point_by_sphere(&self, sphere: &BoundingSphere) -> Vec<HitResult> {
        let mut results = Vec::new();
        let Some(octants) = self.octants.as_ref() else {
            return results;
        };
        let backend = &self.backend;
        let objects = &self.objects;
        let mut stack = hit_stack_pool().acquire();
        traverse(octants, &mut stack, |octant| {
            let mut is_intersect = false;
            backend.nearest_node_by_sphere(
                octant,
                &objects[octant.start..octant.end],
                sphere,
                &mut results,
                &mut is_intersect,
            );
            is_intersect
        });
        results
    }

    /// Unbounded nearest-point search from `point`.
    ///
    /// The search sphere starts effectively infinite and tightens to
    /// `best_distance * heuristic_search_factor` each time a closer
    /// candidate is found, pruning far subtrees as the walk unwinds. The
    /// factor is clamped into `[0.1, 1.0]`; values below 1 trade
    /// completeness for speed.
    pub fn find_nearest_point_from_point(
        &self,
        point: &Point3<Real>,
        heuristic_search_factor: Real,
    ) -> Vec<HitResult> {
        let mut results = Vec::new();
        let Some(octants) = self.octants.as_ref() else {
            return results;
        };
        let factor = heuristic_search_factor.clamp(0.1, 1.0);
        let mut sphere = BoundingSphere::new(*point, Real::MAX);
        let backend = &self.backend;
        let objects = &self.objects;
        let mut stack = hit_stack_pool().acquire();
        traverse(octants, &mut stack, |octant| {
            let mut is_intersect = false;
            backend.nearest_node_by_sphere(
                octant,
                &objects[octant.start..octant.end],
                &sphere,
                &mut results,
                &mut is_intersect,
            );
            if is_intersect {
                if let Some(best) = results.first() {
                    sphere.radius = best.distance * factor;
                }
            }
            is_intersect
        });
        results
    }

    /// Fixed-radius convenience wrapper over
    /// [`Self::find_nearest_point_by_sphere`].
    pub fn find_nearest_point_by_point_and_radius(
        &self,
        point: &Point3<Real>,
        radius: Real,
    ) -> Vec<HitResult> {
        self.find_nearest_point_by_sphere(&BoundingSphere::new(*point, radius))
    }

    /// Tight bound around the items retained at one node; the zero box for
    /// an empty node, `None` before the tree is built.
    pub fn enclosing_box(&self, id: OctantId) -> Option<Aabb> {
        let octants = self.octants.as_ref()?;
        let octant = &octants[id];
        if octant.is_empty() {
            return Some(Aabb::new(Point3::origin(), Point3::origin()));
        }
        let mut bound = self.backend.item_bound(&self.objects[octant.start]);
        for item in &self.objects[octant.start + 1..octant.end] {
            bound.merge(&self.backend.item_bound(item));
        }
        Some(bound)
    }

    /// Wireframe of every octant bound, for debug visualization.
    pub fn octree_line_model(&self) -> LineGeometry {
        let mut builder = LineBuilder::new();
        for octant in self.octants() {
            let center = octant.bound.center();
            let extents = octant.bound.extents();
            builder.add_box(center, extents.x, extents.y, extents.z);
        }
        builder.into_line_geometry()
    }

    /// Whether [`Self::build_tree`] has completed.
    pub const fn is_built(&self) -> bool {
        self.tree_built
    }

    /// Overall bound of the tree (the root octant's bound once built).
    pub const fn bound(&self) -> Aabb {
        self.bound
    }

    /// Number of allocated octants.
    pub fn octant_count(&self) -> usize {
        self.octants.as_ref().map_or(0, OctantArray::len)
    }

    /// All octants in arena order; empty before the tree is built.
    pub fn octants(&self) -> impl Iterator<Item = &Octant> {
        self.octants.iter().flat_map(OctantArray::iter)
    }

    /// The item snapshot, permuted into node order by the build.
    pub fn items(&self) -> &[B::Item] {
        &self.objects
    }

    /// Ancestor bound chains recorded by the last hit-returning
    /// [`Self::hit_test`], when enabled in the build parameter.
    pub fn hit_path_bounding_boxes(&self) -> &[Aabb] {
        &self.hit_path_bounding_boxes
    }

    pub const fn parameter(&self) -> &OctreeBuildParameter {
        &self.parameter
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }
}

/// Subdivide one octant: partition its item range across up to eight
/// children by swapping contained items into contiguous tail blocks, then
/// shrink the parent's range to the leftovers. Returns `false` when the
/// arena refused to grow (the node then keeps its remaining items).
fn build_subtree<B: OctreeBackend>(
    octants: &mut OctantArray,
    index: OctantId,
    objects: &mut [B::Item],
    backend: &B,
    parameter: &OctreeBuildParameter,
) -> bool {
    let mut octant = octants[index];
    if octant.is_built {
        return true;
    }
    let mut ok = true;
    let bound = octant.bound;
    if check_dimension(&bound, parameter.minimum_octant_size)
        && !octant.is_empty()
        && octant.count() > parameter.min_object_size_to_split
    {
        if let Some(child_bounds) = create_octants(&bound, parameter.minimum_octant_size) {
            let start = octant.start;
            for (child_slot, child_bound) in child_bounds.iter().enumerate() {
                let mut count = 0;
                let end = octant.end;
                let mut child_id = OctantId::NONE;
                // Scan the unclaimed range backward, swapping contained
                // items into a block at the tail.
                for i in (start..end).rev() {
                    let item_bound = backend.item_bound(&objects[i]);
                    if backend.item_fits(child_bound, &item_bound, &objects[i]) {
                        if child_id.is_none() {
                            match octants.add(index, child_slot, *child_bound) {
                                Some(id) => {
                                    octant.set_child(child_slot, id);
                                    child_id = id;
                                }
                                None => {
                                    log::debug!(
                                        "octant arena full; node {:?} keeps its remaining items",
                                        index
                                    );
                                    ok = false;
                                    break;
                                }
                            }
                        }
                        count += 1;
                        let claimed = end - count;
                        let child = &mut octants[child_id];
                        child.start = claimed;
                        child.end = end;
                        objects.swap(claimed, i);
                    }
                }
                octant.end = end - count;
            }
        }
    }
    octant.is_built = true;
    octants[index] = octant;
    ok
}

/// Whether a bound is worth splitting: non-degenerate and at least
/// `min_size` in some dimension.
fn check_dimension(bound: &Aabb, min_size: Real) -> bool {
    let dimensions = bound.extents();
    if dimensions == Vector3::zeros() {
        return false;
    }
    !(dimensions.x < min_size && dimensions.y < min_size && dimensions.z < min_size)
}

/// The eight child bounds of `bound`, bisecting every axis at the center.
/// `None` when any dimension is already below `min_size`.
///
/// Slot numbering is fixed: 0 is the min-corner octant, 6 the max-corner
/// octant.
fn create_octants(bound: &Aabb, min_size: Real) -> Option<[Aabb; 8]> {
    let dimensions = bound.extents();
    if dimensions == Vector3::zeros()
        || dimensions.x < min_size
        || dimensions.y < min_size
        || dimensions.z < min_size
    {
        return None;
    }
    let minimum = bound.mins;
    let maximum = bound.maxs;
    let center = bound.center();
    Some([
        Aabb::new(minimum, center),
        Aabb::new(
            Point3::new(center.x, minimum.y, minimum.z),
            Point3::new(maximum.x, center.y, center.z),
        ),
        Aabb::new(
            Point3::new(center.x, minimum.y, center.z),
            Point3::new(maximum.x, center.y, maximum.z),
        ),
        Aabb::new(
            Point3::new(minimum.x, minimum.y, center.z),
            Point3::new(center.x, center.y, maximum.z),
        ),
        Aabb::new(
            Point3::new(minimum.x, center.y, minimum.z),
            Point3::new(center.x, maximum.y, center.z),
        ),
        Aabb::new(
            Point3::new(center.x, center.y, minimum.z),
            Point3::new(maximum.x, maximum.y, center.z),
        ),
        Aabb::new(center, maximum),
        Aabb::new(
            Point3::new(minimum.x, center.y, center.z),
            Point3::new(center.x, maximum.y, maximum.z),
        ),
    ])
}

/// Expand `bound` into the smallest enclosing cube around its center.
fn cubify(bound: &Aabb) -> Aabb {
    let center = bound.center();
    let half = bound.half_extents().max();
    let half = Vector3::repeat(half);
    Aabb::new(center - half, center + half)
}

/// Whether `sphere` misses `bound` entirely.
pub(crate) fn box_disjoint_sphere(bound: &Aabb, sphere: &BoundingSphere) -> bool {
    let clamped = Point3::new(
        sphere.center.x.clamp(bound.mins.x, bound.maxs.x),
        sphere.center.y.clamp(bound.mins.y, bound.maxs.y),
        sphere.center.z.clamp(bound.mins.z, bound.maxs.z),
    );
    (sphere.center - clamped).norm_squared() > sphere.radius * sphere.radius
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bound() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0))
    }

    #[test]
    fn octant_slots_cover_parent() {
        let bound = sample_bound();
        let children = create_octants(&bound, 0.5).unwrap();
        assert_eq!(children[0], Aabb::new(bound.mins, bound.center()));
        assert_eq!(children[6], Aabb::new(bound.center(), bound.maxs));
        let mut merged = children[0];
        for child in &children[1..] {
            merged.merge(child);
        }
        assert_eq!(merged, bound);
        // interiors are disjoint: every child has an eighth of the volume
        for child in &children {
            assert_eq!(child.extents(), Vector3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn no_octants_below_minimum_size() {
        assert!(create_octants(&sample_bound(), 2.5).is_none());
        let flat = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 4.0, 0.5));
        assert!(create_octants(&flat, 1.0).is_none());
    }

    #[test]
    fn dimension_check_needs_one_large_axis() {
        let thin = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(8.0, 0.1, 0.1));
        assert!(check_dimension(&thin, 1.0));
        let tiny = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, 0.5, 0.5));
        assert!(!check_dimension(&tiny, 1.0));
        let degenerate = Aabb::new(Point3::origin(), Point3::origin());
        assert!(!check_dimension(&degenerate, 1.0));
    }

    #[test]
    fn cubify_takes_largest_half_extent() {
        let bound = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 2.0, 1.0));
        let cube = cubify(&bound);
        assert_eq!(cube.extents(), Vector3::new(4.0, 4.0, 4.0));
        assert_eq!(cube.center(), bound.center());
    }

    #[test]
    fn sphere_box_rejection() {
        let bound = sample_bound();
        let inside = BoundingSphere::new(Point3::new(1.0, 1.0, 1.0), 0.1);
        assert!(!box_disjoint_sphere(&bound, &inside));
        let touching = BoundingSphere::new(Point3::new(3.0, 1.0, 1.0), 1.0);
        assert!(!box_disjoint_sphere(&bound, &touching));
        let outside = BoundingSphere::new(Point3::new(5.0, 5.0, 5.0), 1.0);
        assert!(box_disjoint_sphere(&bound, &outside));
    }
}
