//! Static, array-based **octrees** for ray hit-testing and nearest-point
//! queries over large geometry sets.
//!
//! The whole tree lives in one contiguous arena of [`Octant`] records
//! addressed by [`OctantId`], built once by partitioning the item array in
//! place, and walked iteratively with pooled explicit stacks — no recursion,
//! no per-query allocation. Bounding volumes and primitive queries come
//! from [parry](https://parry.rs/).
//!
//! # Features
//! - **f64**: use f64 as Real (default)
//! - **f32**: use f32 as Real, this conflicts with f64
//!
//! # Example
//! ```
//! use nalgebra::{Matrix4, Point3, Vector3};
//! use octrs::{HitContext, MeshGeometry, OctreeBuildParameter, StaticOctree};
//!
//! // one triangle in the z=0 plane
//! let geometry = MeshGeometry::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(4.0, 0.0, 0.0),
//!         Point3::new(0.0, 4.0, 0.0),
//!     ],
//!     vec![0, 1, 2],
//! );
//! let mut octree = StaticOctree::new(geometry, OctreeBuildParameter::default());
//! octree.build_tree().unwrap();
//!
//! let context = HitContext::new(Point3::new(1.0, 1.0, 5.0), -Vector3::z());
//! let hits = octree.hit_test(&context, &Matrix4::identity(), false);
//! assert_eq!(hits.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(unused, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod hit;
pub mod line_builder;
pub mod octant;
pub mod octree;
mod pool;
mod traversal;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::OctreeError;
pub use hit::{HitContext, HitResult};
pub use line_builder::{LineBuilder, LineGeometry};
pub use octant::{Octant, OctantId};
pub use octree::mesh::MeshGeometry;
pub use octree::point::PointGeometry;
pub use octree::{OctreeBackend, OctreeBuildParameter, StaticOctree};
