//! Iterative depth-first traversal over the octant arena.
//!
//! The walk keeps an explicit stack of `(parent, resume slot)` frames
//! instead of recursing, so tree depth never threatens the call stack. A
//! synthetic parent whose only child is the root bootstraps the loop; the
//! visitor's return value decides whether an occupied subtree is entered.

use crate::octant::{OCTANT_SIZE, Octant, OctantArray, OctantId};

/// One suspended level of the walk: the parent being scanned and the child
/// slot to resume after.
pub(crate) type Frame = (OctantId, i32);

fn dummy_parent() -> Octant {
    use crate::float_types::parry3d::bounding_volume::Aabb;
    let mut dummy = Octant::new(OctantId::NONE, OctantId::NONE, Aabb::new_invalid());
    dummy.set_child(0, OctantId::ROOT);
    dummy
}

/// Walk every reachable octant, calling `visit` once per node in
/// depth-first order. Descends into a node's children only when the node
/// has children *and* `visit` returned `true` for it.
pub(crate) fn traverse<F>(octants: &OctantArray, stack: &mut Vec<Frame>, mut visit: F)
where
    F: FnMut(&Octant) -> bool,
{
    stack.clear();
    let mut parent = OctantId::NONE;
    let mut curr: i32 = -1;
    let mut parent_octant = dummy_parent();
    loop {
        loop {
            curr += 1;
            if curr >= OCTANT_SIZE as i32 {
                break;
            }
            if !parent_octant.has_child_at(curr as usize) {
                continue;
            }
            let child_id = parent_octant.child(curr as usize);
            let octant = &octants[child_id];
            let descend = visit(octant);
            if octant.has_children() && descend {
                stack.push((parent, curr));
                parent = child_id;
                curr = -1;
                parent_octant = octants[parent];
            }
        }
        let Some((prev_parent, prev_curr)) = stack.pop() else {
            break;
        };
        parent = prev_parent;
        curr = prev_curr;
        if parent.is_none() {
            break;
        }
        parent_octant = octants[parent];
    }
}

/// Same walk as [`traverse`], but the visitor may grow the arena (used by
/// the builder, which discovers freshly created children as it goes). The
/// descent check re-reads the node after `visit` so children wired during
/// the call are picked up.
pub(crate) fn traverse_mut<F>(octants: &mut OctantArray, stack: &mut Vec<Frame>, mut visit: F)
where
    F: FnMut(&mut OctantArray, OctantId) -> bool,
{
    stack.clear();
    let mut parent = OctantId::NONE;
    let mut curr: i32 = -1;
    let mut parent_octant = dummy_parent();
    loop {
        loop {
            curr += 1;
            if curr >= OCTANT_SIZE as i32 {
                break;
            }
            if !parent_octant.has_child_at(curr as usize) {
                continue;
            }
            let child_id = parent_octant.child(curr as usize);
            let descend = visit(octants, child_id);
            let octant = &octants[child_id];
            if octant.has_children() && descend {
                stack.push((parent, curr));
                parent = child_id;
                curr = -1;
                parent_octant = octants[parent];
            }
        }
        let Some((prev_parent, prev_curr)) = stack.pop() else {
            break;
        };
        parent = prev_parent;
        curr = prev_curr;
        if parent.is_none() {
            break;
        }
        parent_octant = octants[parent];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::parry3d::bounding_volume::Aabb;
    use nalgebra::Point3;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    /// root with children in slots 1 and 6; the slot-1 child has its own
    /// child in slot 0.
    fn sample_arena() -> OctantArray {
        let mut arena = OctantArray::with_root(unit_box(), 0);
        let a = arena.add(OctantId::ROOT, 1, unit_box()).unwrap();
        arena.add(OctantId::ROOT, 6, unit_box()).unwrap();
        arena.add(a, 0, unit_box()).unwrap();
        arena
    }

    #[test]
    fn visits_depth_first_in_slot_order() {
        let arena = sample_arena();
        let mut stack = Vec::new();
        let mut order = Vec::new();
        traverse(&arena, &mut stack, |octant| {
            order.push(octant.index);
            true
        });
        let ids: Vec<_> = arena.iter().map(|o| o.index).collect();
        // root, first child, grandchild, then the slot-6 child
        assert_eq!(order, vec![ids[0], ids[1], ids[3], ids[2]]);
        assert!(stack.is_empty());
    }

    #[test]
    fn pruned_subtrees_are_skipped() {
        let arena = sample_arena();
        let mut stack = Vec::new();
        let mut order = Vec::new();
        traverse(&arena, &mut stack, |octant| {
            order.push(octant.index);
            octant.index == OctantId::ROOT
        });
        // descending only from the root: the grandchild is never visited
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn empty_root_terminates() {
        let arena = OctantArray::with_root(unit_box(), 0);
        let mut stack = Vec::new();
        let mut visited = 0;
        traverse(&arena, &mut stack, |_| {
            visited += 1;
            true
        });
        assert_eq!(visited, 1);
    }
}
