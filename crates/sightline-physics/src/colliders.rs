//! Collision shape generation from sightline meshes.

use nalgebra::{Point3, Vector3};
use parry3d::shape::{ConvexPolyhedron, SharedShape, TriMesh};
use serde::{Deserialize, Serialize};
use sightline_core::{EntityId, TriangleMesh};

use crate::error::{PhysicsError, Result};

/// Strategy for generating collision shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderStrategy {
    /// Use triangle mesh (accurate, slower).
    #[default]
    TriMesh,
    /// Use convex hull (fast, fills concavities).
    ConvexHull,
    /// Use axis-aligned bounding box (fastest, rough).
    Aabb,
}

/// A shape plus the translation it must be placed at.
#[derive(Clone)]
pub struct ColliderShape {
    /// The collision shape.
    pub shape: SharedShape,
    /// World translation of the shape's local origin.
    pub translation: Vector3<f32>,
}

impl std::fmt::Debug for ColliderShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderShape")
            .field("shape_type", &self.shape.shape_type())
            .field("translation", &self.translation)
            .finish()
    }
}

/// Generate a collision shape from a world-space triangle mesh.
pub fn mesh_to_collider(
    mesh: &TriangleMesh,
    strategy: ColliderStrategy,
    entity: EntityId,
) -> Result<ColliderShape> {
    if mesh.positions.is_empty() || mesh.indices.is_empty() {
        return Err(PhysicsError::CollisionShape {
            entity,
            reason: "Empty mesh".to_string(),
        });
    }
    mesh.validate()?;

    match strategy {
        ColliderStrategy::TriMesh => create_trimesh(mesh, entity),
        ColliderStrategy::ConvexHull => create_convex_hull(mesh, entity),
        ColliderStrategy::Aabb => Ok(create_aabb(mesh)),
    }
}

fn points_f32(mesh: &TriangleMesh) -> Vec<Point3<f32>> {
    mesh.positions
        .iter()
        .map(|p| Point3::new(p.x as f32, p.y as f32, p.z as f32))
        .collect()
}

fn create_trimesh(mesh: &TriangleMesh, entity: EntityId) -> Result<ColliderShape> {
    match TriMesh::new(points_f32(mesh), mesh.indices.clone()) {
        Ok(trimesh) => Ok(ColliderShape {
            shape: SharedShape::new(trimesh),
            translation: Vector3::zeros(),
        }),
        Err(e) => Err(PhysicsError::CollisionShape {
            entity,
            reason: format!("Failed to create trimesh: {:?}", e),
        }),
    }
}

fn create_convex_hull(mesh: &TriangleMesh, entity: EntityId) -> Result<ColliderShape> {
    let points = points_f32(mesh);
    if points.len() < 4 {
        return Err(PhysicsError::CollisionShape {
            entity,
            reason: "Need at least 4 points for convex hull".to_string(),
        });
    }

    match ConvexPolyhedron::from_convex_hull(&points) {
        Some(hull) => Ok(ColliderShape {
            shape: SharedShape::new(hull),
            translation: Vector3::zeros(),
        }),
        // Flat or otherwise degenerate point sets.
        None => Ok(create_aabb(mesh)),
    }
}

fn create_aabb(mesh: &TriangleMesh) -> ColliderShape {
    let mut min = Vector3::repeat(f32::INFINITY);
    let mut max = Vector3::repeat(f32::NEG_INFINITY);
    for p in points_f32(mesh) {
        min = min.inf(&p.coords);
        max = max.sup(&p.coords);
    }

    let half_extents = (max - min) / 2.0;
    ColliderShape {
        shape: SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
        translation: (min + max) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> TriangleMesh {
        TriangleMesh::cube(2.0, 2.0, 2.0)
    }

    #[test]
    fn test_trimesh() {
        let shape = mesh_to_collider(&cube(), ColliderStrategy::TriMesh, EntityId(1)).unwrap();
        assert!(shape.shape.as_trimesh().is_some());
        assert_eq!(shape.translation, Vector3::zeros());
    }

    #[test]
    fn test_convex_hull() {
        let shape = mesh_to_collider(&cube(), ColliderStrategy::ConvexHull, EntityId(1)).unwrap();
        assert!(shape.shape.as_convex_polyhedron().is_some());
    }

    #[test]
    fn test_aabb_is_centered() {
        let moved = cube().transformed(&sightline_math::Transform::translation(10.0, 0.0, -4.0));
        let shape = mesh_to_collider(&moved, ColliderStrategy::Aabb, EntityId(1)).unwrap();
        let cuboid = shape.shape.as_cuboid().unwrap();
        assert!((cuboid.half_extents - Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
        assert!((shape.translation - Vector3::new(10.0, 0.0, -4.0)).norm() < 1e-6);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let empty = TriangleMesh::new(Vec::new(), Vec::new());
        let err = mesh_to_collider(&empty, ColliderStrategy::TriMesh, EntityId(4)).unwrap_err();
        assert!(matches!(err, PhysicsError::CollisionShape { entity: EntityId(4), .. }));
    }

    #[test]
    fn test_bad_indices_rejected() {
        let mut mesh = cube();
        mesh.indices.push([0, 1, 99]);
        let err = mesh_to_collider(&mesh, ColliderStrategy::TriMesh, EntityId(4)).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidMesh(_)));
    }
}
