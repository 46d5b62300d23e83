#![warn(missing_docs)]

//! Monte Carlo surface-visibility estimation.
//!
//! Estimates what fraction of an object's surface can be seen from a
//! viewpoint by sampling points on its camera-facing, in-view triangles and
//! casting a segment from each point to the viewpoint.
//!
//! # Architecture
//!
//! - [`geometry`] - world-space triangle snapshot with per-slot areas
//! - [`frustum`] - cameras, viewpoints and frustum plane tests
//! - [`classify`] - frustum and backface culling into eligible/excluded slots
//! - [`sampler`] - area-weighted sampling of surface points
//! - [`raycast`] - occlusion queries against an [`IntersectionOracle`]
//! - [`estimator`] - the full cycle, producing a [`VisibilityReport`]
//! - [`poi`] - a [`PointOfInterest`] binding updated between frames
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use sightline_core::{
//!     estimate_visibility, Camera, EntityId, EstimatorSettings, TriangleMesh, TriangleScene,
//! };
//! use sightline_math::{Point3, Transform};
//!
//! let mesh = TriangleMesh::cube(1.0, 1.0, 1.0);
//! let mut scene = TriangleScene::new();
//! scene.add_mesh(EntityId(1), &mesh, &Transform::identity());
//!
//! let viewpoint = Camera::looking_at(Point3::new(0.0, 0.0, 10.0), Point3::origin())
//!     .viewpoint()
//!     .unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let report = estimate_visibility(
//!     &mesh,
//!     &Transform::identity(),
//!     EntityId(1),
//!     &viewpoint,
//!     &EstimatorSettings::default(),
//!     &scene,
//!     &mut rng,
//! )
//! .unwrap();
//! assert_eq!(report.label(), "100.0%");
//! ```

pub mod classify;
pub mod config;
mod error;
pub mod estimator;
pub mod frustum;
pub mod geometry;
pub mod mesh;
pub mod oracle;
pub mod poi;
pub mod raycast;
pub mod sampler;
pub mod scene;

pub use classify::{classify, Classified, ClassifiedTriangles};
pub use config::{EstimatorSettings, SamplingStrategy};
pub use error::{Result, VisibilityError};
pub use estimator::{estimate_snapshot, estimate_visibility, Outcome, VisibilityReport};
pub use frustum::{Camera, Frustum, Plane, Viewpoint};
pub use geometry::{build_snapshot, GeometrySnapshot, Triangle};
pub use mesh::TriangleMesh;
pub use oracle::{EntityId, Hit, IntersectionOracle, OccluderFilter, OracleError, Ray};
pub use poi::PointOfInterest;
pub use raycast::DebugRay;
pub use scene::TriangleScene;
