//! The intersection oracle seam.
//!
//! The estimator never intersects geometry itself. It hands rays to an
//! [`IntersectionOracle`], which reports every entity the segment touches.
//! [`TriangleScene`](crate::scene::TriangleScene) is the bundled pure-Rust
//! implementation; `sightline-physics` provides one backed by rapier.

use serde::{Deserialize, Serialize};
use sightline_math::{Dir3, Point3, Vec3};
use thiserror::Error;

/// Opaque identity of something an oracle can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-line queried against an oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Point3,
    /// Unit direction.
    pub direction: Dir3,
}

impl Ray {
    /// Ray from `origin` along `direction`, normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: Dir3::new_normalize(direction),
        }
    }

    /// Ray from `from` toward `to`, plus the distance between them.
    ///
    /// Returns `None` when the two points coincide.
    pub fn between(from: Point3, to: Point3) -> Option<(Self, f64)> {
        let delta = to - from;
        let distance = delta.norm();
        if distance <= f64::EPSILON {
            return None;
        }
        Some((Self::new(from, delta), distance))
    }
}

/// One entity touched by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// What was hit.
    pub entity: EntityId,
    /// Distance from the ray origin.
    pub distance: f64,
}

/// A ray query the oracle could not answer.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("intersection query failed: {0}")]
pub struct OracleError(pub String);

/// Answers "what lies along this segment".
pub trait IntersectionOracle: Send + Sync {
    /// Every entity intersected by `ray` within `max_distance` of its origin.
    ///
    /// Order is unspecified; one entity may appear more than once.
    fn intersect(&self, ray: &Ray, max_distance: f64) -> Result<Vec<Hit>, OracleError>;
}

impl<T: IntersectionOracle + ?Sized> IntersectionOracle for &T {
    fn intersect(&self, ray: &Ray, max_distance: f64) -> Result<Vec<Hit>, OracleError> {
        (**self).intersect(ray, max_distance)
    }
}

/// Which hits count as occluders: anything but the target and the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccluderFilter {
    /// The object whose visibility is being measured.
    pub target: EntityId,
    /// The viewpoint's own collision entity.
    pub viewpoint: Option<EntityId>,
}

impl OccluderFilter {
    /// True if `entity` blocks the line of sight.
    pub fn is_occluder(&self, entity: EntityId) -> bool {
        entity != self.target && Some(entity) != self.viewpoint
    }

    /// True if any hit in `hits` blocks the line of sight.
    pub fn blocks(&self, hits: &[Hit]) -> bool {
        hits.iter().any(|hit| self.is_occluder(hit.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -4.0, 0.0));
        assert!((ray.direction.y + 1.0).abs() < 1e-12);
        assert_eq!(ray.origin, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_between() {
        let (ray, dist) =
            Ray::between(Point3::new(1.0, 1.0, 1.0), Point3::new(1.0, 1.0, 4.0)).unwrap();
        assert!((dist - 3.0).abs() < 1e-12);
        assert!((ray.direction.z - 1.0).abs() < 1e-12);
        assert!(Ray::between(Point3::origin(), Point3::origin()).is_none());
    }

    #[test]
    fn test_filter_ignores_self_and_viewpoint() {
        let filter = OccluderFilter {
            target: EntityId(1),
            viewpoint: Some(EntityId(2)),
        };
        let hit = |id| Hit {
            entity: EntityId(id),
            distance: 1.0,
        };
        assert!(!filter.blocks(&[hit(1), hit(2)]));
        assert!(filter.blocks(&[hit(1), hit(3)]));
        assert!(!filter.blocks(&[]));
    }
}
