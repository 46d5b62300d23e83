//! Oracle construction for a resolved scene.

use anyhow::{Context, Result};
use clap::ValueEnum;
use sightline_core::{IntersectionOracle, TriangleMesh, TriangleScene};
use sightline_ir::ResolvedScene;
use sightline_physics::{ColliderStrategy, CollisionWorld};

/// Which intersection oracle answers the ray queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Brute-force triangle scene.
    Mesh,
    /// Rapier colliders.
    Physics,
}

/// Collider proxy used by the physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColliderArg {
    /// Exact triangle mesh.
    Trimesh,
    /// Convex hull of each object.
    ConvexHull,
    /// Axis-aligned box of each object.
    Aabb,
}

impl From<ColliderArg> for ColliderStrategy {
    fn from(arg: ColliderArg) -> Self {
        match arg {
            ColliderArg::Trimesh => ColliderStrategy::TriMesh,
            ColliderArg::ConvexHull => ColliderStrategy::ConvexHull,
            ColliderArg::Aabb => ColliderStrategy::Aabb,
        }
    }
}

/// Segments of the sphere mesh standing in for the viewer's body.
const VIEWER_SEGMENTS: u32 = 12;

/// Register every object (and the viewer's body) with the chosen backend.
pub fn build_oracle(
    scene: &ResolvedScene,
    backend: Backend,
    collider: ColliderArg,
) -> Result<Box<dyn IntersectionOracle>> {
    match backend {
        Backend::Mesh => {
            let mut oracle = TriangleScene::new();
            for (entity, mesh, transform) in &scene.objects {
                oracle.add_mesh(*entity, mesh, transform);
            }
            if let Some((entity, radius)) = scene.viewer {
                let body = TriangleMesh::uv_sphere(radius, VIEWER_SEGMENTS);
                let eye = scene.viewpoint.position;
                oracle.add_mesh(
                    entity,
                    &body,
                    &sightline_math::Transform::translation(eye.x, eye.y, eye.z),
                );
            }
            Ok(Box::new(oracle))
        }
        Backend::Physics => {
            let strategy = ColliderStrategy::from(collider);
            let mut world = CollisionWorld::new();
            for (entity, mesh, transform) in &scene.objects {
                world
                    .add_mesh(*entity, mesh, transform, strategy)
                    .with_context(|| format!("building collider for {entity}"))?;
            }
            if let Some((entity, radius)) = scene.viewer {
                world
                    .add_ball(entity, &scene.viewpoint.position, radius)
                    .context("building viewer collider")?;
            }
            Ok(Box::new(world))
        }
    }
}
