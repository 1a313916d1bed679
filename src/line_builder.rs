//! Line-list geometry builder used for debug wireframes.

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Line-list geometry: `indices` holds pairs of offsets into `positions`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    pub positions: Vec<Point3<Real>>,
    pub indices: Vec<u32>,
}

impl LineGeometry {
    /// Number of line segments.
    pub fn segment_count(&self) -> usize {
        self.indices.len() / 2
    }
}

/// Incrementally accumulates line segments into a [`LineGeometry`].
#[derive(Debug, Clone, Default)]
pub struct LineBuilder {
    positions: Vec<Point3<Real>>,
    indices: Vec<u32>,
}

impl LineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a polyline through `points`, closing it back to the first
    /// point when `closed` is set.
    pub fn add(&mut self, closed: bool, points: &[Point3<Real>]) {
        let i0 = self.positions.len() as u32;
        self.positions.extend_from_slice(points);
        for i in 0..points.len().saturating_sub(1) as u32 {
            self.indices.push(i0 + i);
            self.indices.push(i0 + i + 1);
        }
        if closed && points.len() > 1 {
            self.indices.push(i0 + points.len() as u32 - 1);
            self.indices.push(i0);
        }
    }

    /// Append a single segment.
    pub fn add_line(&mut self, p0: Point3<Real>, p1: Point3<Real>) {
        let i0 = self.positions.len() as u32;
        self.positions.push(p0);
        self.positions.push(p1);
        self.indices.push(i0);
        self.indices.push(i0 + 1);
    }

    /// Append the twelve edges of an axis-aligned box centered at `center`.
    pub fn add_box(&mut self, center: Point3<Real>, xlength: Real, ylength: Real, zlength: Real) {
        let i0 = self.positions.len() as u32;
        let dx = Vector3::new(xlength / 2.0, 0.0, 0.0);
        let dy = Vector3::new(0.0, ylength / 2.0, 0.0);
        let dz = Vector3::new(0.0, 0.0, zlength / 2.0);
        self.add(
            true,
            &[
                center - dx - dy - dz,
                center + dx - dy - dz,
                center + dx + dy - dz,
                center - dx + dy - dz,
            ],
        );
        self.add(
            true,
            &[
                center - dx - dy + dz,
                center + dx - dy + dz,
                center + dx + dy + dz,
                center - dx + dy + dz,
            ],
        );
        self.indices.extend_from_slice(&[
            i0,
            i0 + 4,
            i0 + 1,
            i0 + 5,
            i0 + 2,
            i0 + 6,
            i0 + 3,
            i0 + 7,
        ]);
    }

    /// Finish building and take the accumulated geometry.
    pub fn into_line_geometry(self) -> LineGeometry {
        LineGeometry {
            positions: self.positions,
            indices: self.indices,
        }
    }
}
