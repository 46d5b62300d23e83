//! Collision world backed by rapier's query pipeline.

use std::collections::HashMap;

use log::debug;
use nalgebra::{Point3, Vector3};
use rapier3d::dynamics::{IslandManager, RigidBodySet};
use rapier3d::geometry::{Collider, ColliderBuilder, ColliderHandle, ColliderSet, Ray as RapierRay};
use rapier3d::pipeline::{QueryFilter, QueryPipeline};
use sightline_core::{EntityId, Hit, IntersectionOracle, OracleError, Ray, TriangleMesh};
use sightline_math::Transform;

use crate::colliders::{mesh_to_collider, ColliderStrategy};
use crate::error::{PhysicsError, Result};

/// Static colliders that answer ray queries.
///
/// Every collider is fixed and stores its [`EntityId`] in its user data.
/// Geometry is baked into world space when added; moving an entity means
/// removing and re-adding it.
pub struct CollisionWorld {
    islands: IslandManager,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,

    entity_to_collider: HashMap<EntityId, ColliderHandle>,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            islands: IslandManager::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            entity_to_collider: HashMap::new(),
        }
    }

    /// Add `mesh`, placed by `transform`, as the collider of `entity`.
    pub fn add_mesh(
        &mut self,
        entity: EntityId,
        mesh: &TriangleMesh,
        transform: &Transform,
        strategy: ColliderStrategy,
    ) -> Result<ColliderHandle> {
        if self.entity_to_collider.contains_key(&entity) {
            return Err(PhysicsError::DuplicateEntity(entity));
        }

        let world_mesh = mesh.transformed(transform);
        let shape = mesh_to_collider(&world_mesh, strategy, entity)?;
        let collider = ColliderBuilder::new(shape.shape)
            .translation(shape.translation)
            .user_data(entity.0 as u128)
            .build();
        debug!(
            "collider for {entity}: {:?}, {} triangles",
            strategy,
            mesh.num_triangles()
        );
        Ok(self.insert(entity, collider))
    }

    /// Add a sphere collider, e.g. around a viewer's head.
    pub fn add_ball(
        &mut self,
        entity: EntityId,
        center: &sightline_math::Point3,
        radius: f64,
    ) -> Result<ColliderHandle> {
        if self.entity_to_collider.contains_key(&entity) {
            return Err(PhysicsError::DuplicateEntity(entity));
        }
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(PhysicsError::CollisionShape {
                entity,
                reason: format!("Invalid ball radius {radius}"),
            });
        }

        let collider = ColliderBuilder::ball(radius as f32)
            .translation(Vector3::new(center.x as f32, center.y as f32, center.z as f32))
            .user_data(entity.0 as u128)
            .build();
        Ok(self.insert(entity, collider))
    }

    fn insert(&mut self, entity: EntityId, collider: Collider) -> ColliderHandle {
        let handle = self.colliders.insert(collider);
        self.entity_to_collider.insert(entity, handle);
        self.query_pipeline.update(&self.colliders);
        handle
    }

    /// Remove the collider of `entity`.
    pub fn remove(&mut self, entity: EntityId) -> Result<()> {
        let handle = self
            .entity_to_collider
            .remove(&entity)
            .ok_or(PhysicsError::UnknownEntity(entity))?;
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false);
        self.query_pipeline.update(&self.colliders);
        Ok(())
    }

    /// Collider handle of `entity`.
    pub fn collider(&self, entity: EntityId) -> Option<ColliderHandle> {
        self.entity_to_collider.get(&entity).copied()
    }

    /// Get all registered entity IDs.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entity_to_collider.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of colliders.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// True if there are no colliders.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl IntersectionOracle for CollisionWorld {
    fn intersect(
        &self,
        ray: &Ray,
        max_distance: f64,
    ) -> std::result::Result<Vec<Hit>, OracleError> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(OracleError(format!("invalid max distance {max_distance}")));
        }

        let origin = Point3::new(ray.origin.x as f32, ray.origin.y as f32, ray.origin.z as f32);
        let dir = Vector3::new(
            ray.direction.x as f32,
            ray.direction.y as f32,
            ray.direction.z as f32,
        );
        let rapier_ray = RapierRay::new(origin, dir);

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &rapier_ray,
            max_distance as f32,
            true,
            QueryFilter::default(),
            |handle, intersection| {
                if let Some(collider) = self.colliders.get(handle) {
                    hits.push(Hit {
                        entity: EntityId(collider.user_data as u64),
                        distance: intersection.time_of_impact as f64,
                    });
                }
                true
            },
        );
        Ok(hits)
    }
}
