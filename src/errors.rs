//! Build errors

/// All the ways octree construction can fail.
///
/// Query-time degradations (non-invertible transforms, degenerate bounds)
/// are *not* errors; they fall back to "no result". Only arena capacity
/// exhaustion is surfaced, and even then the tree remains queryable with
/// the affected nodes kept as leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OctreeError {
    /// Growing the octant arena any further would overflow the index range.
    #[error("octant arena exceeded the maximum indexable node count")]
    CapacityExceeded,
}
