//! World-space geometry snapshots.
//!
//! A snapshot is rebuilt every evaluation cycle from the bound mesh and its
//! object-to-world transform. It owns two parallel sequences, triangles and
//! their areas, which stay index-aligned for the rest of the pipeline.

use log::trace;
use sightline_math::{Aabb3, Point3, Transform, Vec3};

use crate::error::Result;
use crate::mesh::TriangleMesh;

/// A world-space triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub v0: Point3,
    /// Second vertex.
    pub v1: Point3,
    /// Third vertex.
    pub v2: Point3,
}

impl Triangle {
    /// Create a triangle from its three vertices.
    pub fn new(v0: Point3, v1: Point3, v2: Point3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal, `cross(v1 - v0, v2 - v0)`.
    pub fn cross(&self) -> Vec3 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Surface area.
    pub fn area(&self) -> f64 {
        self.cross().norm() / 2.0
    }

    /// Average of the three vertices.
    pub fn centroid(&self) -> Point3 {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Barycentric coordinates `(w0, w1, w2)` of `p` projected onto the
    /// triangle's plane. Returns `None` for degenerate triangles.
    pub fn barycentric(&self, p: &Point3) -> Option<(f64, f64, f64)> {
        let e1 = self.v1 - self.v0;
        let e2 = self.v2 - self.v0;
        let d = p - self.v0;
        let d11 = e1.dot(&e1);
        let d12 = e1.dot(&e2);
        let d22 = e2.dot(&e2);
        let dp1 = d.dot(&e1);
        let dp2 = d.dot(&e2);
        let denom = d11 * d22 - d12 * d12;
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let w1 = (d22 * dp1 - d12 * dp2) / denom;
        let w2 = (d11 * dp2 - d12 * dp1) / denom;
        Some((1.0 - w1 - w2, w1, w2))
    }
}

/// Triangles of one object in world space plus their areas.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySnapshot {
    triangles: Vec<Triangle>,
    areas: Vec<f64>,
    bounds: Aabb3,
}

impl GeometrySnapshot {
    /// World-space triangles in mesh face order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Area of each triangle; `areas()[i]` belongs to `triangles()[i]`.
    pub fn areas(&self) -> &[f64] {
        &self.areas
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh had no faces.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sum of all triangle areas.
    pub fn total_area(&self) -> f64 {
        self.areas.iter().sum()
    }

    /// World-space bounds of every triangle vertex.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }
}

/// Transform every face of `mesh` into world space and record its area.
pub fn build_snapshot(mesh: &TriangleMesh, transform: &Transform) -> Result<GeometrySnapshot> {
    mesh.validate()?;

    let mut triangles = Vec::with_capacity(mesh.num_triangles());
    let mut areas = Vec::with_capacity(mesh.num_triangles());
    let mut bounds = Aabb3::empty();

    for [a, b, c] in mesh.triangles() {
        let tri = Triangle::new(
            transform.apply_point(&a),
            transform.apply_point(&b),
            transform.apply_point(&c),
        );
        bounds.include_point(&tri.v0);
        bounds.include_point(&tri.v1);
        bounds.include_point(&tri.v2);
        areas.push(tri.area());
        triangles.push(tri);
    }

    trace!(
        "snapshot: {} triangles, total area {:.4}",
        triangles.len(),
        areas.iter().sum::<f64>()
    );

    Ok(GeometrySnapshot {
        triangles,
        areas,
        bounds,
    })
}
