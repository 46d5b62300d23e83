//! Indexed triangle meshes and a few primitive generators.

use std::f64::consts::PI;

use sightline_math::{Point3, Transform};

use crate::error::{Result, VisibilityError};

/// Local-space triangle mesh: vertex positions plus index triples.
///
/// Triangles are expected to wind counter-clockwise when seen from outside,
/// so that `cross(v1 - v0, v2 - v0)` is the outward normal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub positions: Vec<Point3>,
    /// One `[a, b, c]` triple per triangle.
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh from positions and index triples.
    pub fn new(positions: Vec<Point3>, indices: Vec<[u32; 3]>) -> Self {
        Self { positions, indices }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Check that every index refers to an existing vertex.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        for (face, tri) in self.indices.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&i| i as usize >= n) {
                return Err(VisibilityError::InvalidMesh(format!(
                    "face {face} references vertex {bad} but mesh has {n} vertices"
                )));
            }
        }
        Ok(())
    }

    /// Iterate the three corner positions of every triangle in face order.
    ///
    /// Panics on out-of-range indices; call [`validate`](Self::validate) first.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.indices.iter().map(move |&[a, b, c]| {
            [
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            ]
        })
    }

    /// Copy of this mesh with every vertex moved by `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            positions: self
                .positions
                .iter()
                .map(|p| transform.apply_point(p))
                .collect(),
            indices: self.indices.clone(),
        }
    }

    /// Axis-aligned box of size `(sx, sy, sz)` centred at the origin.
    pub fn cube(sx: f64, sy: f64, sz: f64) -> Self {
        let (hx, hy, hz) = (sx / 2.0, sy / 2.0, sz / 2.0);
        let positions = vec![
            Point3::new(-hx, -hy, -hz),
            Point3::new(hx, -hy, -hz),
            Point3::new(hx, hy, -hz),
            Point3::new(-hx, hy, -hz),
            Point3::new(-hx, -hy, hz),
            Point3::new(hx, -hy, hz),
            Point3::new(hx, hy, hz),
            Point3::new(-hx, hy, hz),
        ];
        let indices = vec![
            // +Z
            [4, 5, 6],
            [4, 6, 7],
            // -Z
            [0, 3, 2],
            [0, 2, 1],
            // +X
            [1, 2, 6],
            [1, 6, 5],
            // -X
            [0, 4, 7],
            [0, 7, 3],
            // +Y
            [3, 7, 6],
            [3, 6, 2],
            // -Y
            [0, 1, 5],
            [0, 5, 4],
        ];
        Self { positions, indices }
    }

    /// Single-sided rectangle in the XY plane facing +Z, centred at the origin.
    pub fn quad(width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            positions: vec![
                Point3::new(-hw, -hh, 0.0),
                Point3::new(hw, -hh, 0.0),
                Point3::new(hw, hh, 0.0),
                Point3::new(-hw, hh, 0.0),
            ],
            indices: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    /// UV sphere centred at the origin with `segments` slices around Y.
    ///
    /// Uses `segments / 2` stacks (at least 2). Pole triangles that would be
    /// degenerate are omitted.
    pub fn uv_sphere(radius: f64, segments: u32) -> Self {
        let segments = segments.max(3);
        let stacks = (segments / 2).max(2);
        let ring = segments + 1;

        let mut positions = Vec::with_capacity((ring * (stacks + 1)) as usize);
        for i in 0..=stacks {
            let phi = PI * i as f64 / stacks as f64;
            let (sp, cp) = phi.sin_cos();
            for j in 0..=segments {
                let theta = 2.0 * PI * j as f64 / segments as f64;
                let (st, ct) = theta.sin_cos();
                positions.push(Point3::new(radius * sp * ct, radius * cp, radius * sp * st));
            }
        }

        let mut indices = Vec::with_capacity((2 * segments * stacks) as usize);
        for i in 0..stacks {
            for j in 0..segments {
                let a = i * ring + j;
                let b = a + ring;
                if i != 0 {
                    indices.push([a, a + 1, b]);
                }
                if i != stacks - 1 {
                    indices.push([a + 1, b + 1, b]);
                }
            }
        }

        Self { positions, indices }
    }
}
