#![warn(missing_docs)]

//! Rapier-backed intersection oracle for sightline.
//!
//! [`CollisionWorld`] keeps a set of fixed rapier colliders, one per
//! [`EntityId`](sightline_core::EntityId), and answers the estimator's
//! segment queries through rapier's `QueryPipeline`. Use it when the scene
//! already lives in a physics engine, or when convex-hull or box proxies
//! are good enough for occlusion.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use sightline_core::{estimate_visibility, Camera, EntityId, EstimatorSettings, TriangleMesh};
//! use sightline_math::{Point3, Transform};
//! use sightline_physics::{ColliderStrategy, CollisionWorld};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let statue = TriangleMesh::cube(1.0, 1.0, 1.0);
//! let placement = Transform::identity();
//!
//! let mut world = CollisionWorld::new();
//! world.add_mesh(EntityId(1), &statue, &placement, ColliderStrategy::TriMesh)?;
//!
//! let viewpoint =
//!     Camera::looking_at(Point3::new(0.0, 0.0, 10.0), Point3::origin()).viewpoint()?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(3);
//! let report = estimate_visibility(
//!     &statue,
//!     &placement,
//!     EntityId(1),
//!     &viewpoint,
//!     &EstimatorSettings::default(),
//!     &world,
//!     &mut rng,
//! )?;
//! assert_eq!(report.visibility, 1.0);
//! # Ok(())
//! # }
//! ```

mod colliders;
mod error;
mod world;

pub use colliders::{mesh_to_collider, ColliderShape, ColliderStrategy};
pub use error::{PhysicsError, Result};
pub use world::CollisionWorld;
