//! Test support library
//! Geometry generators and tolerance helpers shared by the test suites.

#![allow(dead_code)]

use nalgebra::Point3;
use octrs::{MeshGeometry, float_types::Real};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned cube as a 12-triangle list centered at `center`.
pub fn cube(center: Point3<Real>, size: Real) -> (Vec<Point3<Real>>, Vec<u32>) {
    let h = size / 2.0;
    let positions = vec![
        Point3::new(center.x - h, center.y - h, center.z - h),
        Point3::new(center.x + h, center.y - h, center.z - h),
        Point3::new(center.x + h, center.y + h, center.z - h),
        Point3::new(center.x - h, center.y + h, center.z - h),
        Point3::new(center.x - h, center.y - h, center.z + h),
        Point3::new(center.x + h, center.y - h, center.z + h),
        Point3::new(center.x + h, center.y + h, center.z + h),
        Point3::new(center.x - h, center.y + h, center.z + h),
    ];
    let quads: [[u32; 4]; 6] = [
        [0, 1, 2, 3], // z-
        [4, 5, 6, 7], // z+
        [0, 1, 5, 4], // y-
        [3, 2, 6, 7], // y+
        [0, 3, 7, 4], // x-
        [1, 2, 6, 5], // x+
    ];
    let mut indices = Vec::with_capacity(36);
    for [a, b, c, d] in quads {
        indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
    (positions, indices)
}

/// Concatenate unit-winding cubes at each center into one triangle mesh.
/// Cube `i` owns triangles `[12 * i, 12 * i + 12)`.
pub fn cubes_mesh(centers: &[Point3<Real>], size: Real) -> MeshGeometry {
    let mut positions = Vec::with_capacity(centers.len() * 8);
    let mut indices = Vec::with_capacity(centers.len() * 36);
    for center in centers {
        let base = positions.len() as u32;
        let (p, i) = cube(*center, size);
        positions.extend(p);
        indices.extend(i.into_iter().map(|index| index + base));
    }
    MeshGeometry::new(positions, indices)
}

/// Evenly spaced grid of `n³` centers filling `[low, high]³`.
pub fn grid_centers(n: usize, low: Real, high: Real) -> Vec<Point3<Real>> {
    let step = (high - low) / n as Real;
    let mut centers = Vec::with_capacity(n * n * n);
    for x in 0..n {
        for y in 0..n {
            for z in 0..n {
                centers.push(Point3::new(
                    low + step * (x as Real + 0.5),
                    low + step * (y as Real + 0.5),
                    low + step * (z as Real + 0.5),
                ));
            }
        }
    }
    centers
}
