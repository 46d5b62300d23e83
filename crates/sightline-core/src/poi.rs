//! Point-of-interest binding.
//!
//! A [`PointOfInterest`] ties a target entity to its mesh, its current
//! transform, the viewpoint it is judged from and the estimator settings.
//! The host updates the transform and viewpoint between frames and calls
//! [`PointOfInterest::evaluate`] once per cycle.

use rand::Rng;
use sightline_math::Transform;

use crate::config::EstimatorSettings;
use crate::error::{Result, VisibilityError};
use crate::estimator::{estimate_visibility, VisibilityReport};
use crate::frustum::Viewpoint;
use crate::mesh::TriangleMesh;
use crate::oracle::{EntityId, IntersectionOracle};

/// An object whose visibility is tracked over time.
#[derive(Debug, Clone)]
pub struct PointOfInterest {
    entity: EntityId,
    mesh: Option<TriangleMesh>,
    transform: Transform,
    viewpoint: Option<Viewpoint>,
    settings: EstimatorSettings,
    last: Option<VisibilityReport>,
}

impl PointOfInterest {
    /// Unbound point of interest for `entity` with default settings.
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            mesh: None,
            transform: Transform::identity(),
            viewpoint: None,
            settings: EstimatorSettings::default(),
            last: None,
        }
    }

    /// Bind the mesh.
    pub fn with_mesh(mut self, mesh: TriangleMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Set the initial object-to-world transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Bind the viewpoint.
    pub fn with_viewpoint(mut self, viewpoint: Viewpoint) -> Self {
        self.viewpoint = Some(viewpoint);
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: EstimatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The tracked entity.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Current settings.
    pub fn settings(&self) -> &EstimatorSettings {
        &self.settings
    }

    /// Mutable settings, applied from the next cycle on.
    pub fn settings_mut(&mut self) -> &mut EstimatorSettings {
        &mut self.settings
    }

    /// Move the object.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Move the viewer.
    pub fn set_viewpoint(&mut self, viewpoint: Viewpoint) {
        self.viewpoint = Some(viewpoint);
    }

    /// Swap the mesh.
    pub fn set_mesh(&mut self, mesh: TriangleMesh) {
        self.mesh = Some(mesh);
    }

    /// Report from the most recent successful cycle.
    pub fn last_report(&self) -> Option<&VisibilityReport> {
        self.last.as_ref()
    }

    /// Run one evaluation cycle against `oracle`.
    pub fn evaluate<O, R>(&mut self, oracle: &O, rng: &mut R) -> Result<&VisibilityReport>
    where
        O: IntersectionOracle + ?Sized,
        R: Rng + ?Sized,
    {
        let mesh = self.mesh.as_ref().ok_or(VisibilityError::MissingMesh)?;
        let viewpoint = self
            .viewpoint
            .as_ref()
            .ok_or(VisibilityError::MissingViewpoint)?;

        let report = estimate_visibility(
            mesh,
            &self.transform,
            self.entity,
            viewpoint,
            &self.settings,
            oracle,
            rng,
        )?;
        Ok(&*self.last.insert(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Outcome;
    use crate::frustum::Camera;
    use crate::scene::TriangleScene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sightline_math::Point3;

    fn viewpoint() -> Viewpoint {
        Camera::looking_at(Point3::new(0.0, 0.0, 10.0), Point3::origin())
            .viewpoint()
            .unwrap()
    }

    #[test]
    fn test_missing_bindings() {
        let scene = TriangleScene::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let mut poi = PointOfInterest::new(EntityId(1)).with_viewpoint(viewpoint());
        assert!(matches!(
            poi.evaluate(&scene, &mut rng),
            Err(VisibilityError::MissingMesh)
        ));

        let mut poi = PointOfInterest::new(EntityId(1)).with_mesh(TriangleMesh::quad(1.0, 1.0));
        assert!(matches!(
            poi.evaluate(&scene, &mut rng),
            Err(VisibilityError::MissingViewpoint)
        ));
        assert!(poi.last_report().is_none());
    }

    #[test]
    fn test_moving_out_of_view() {
        let mesh = TriangleMesh::quad(1.0, 1.0);
        let mut scene = TriangleScene::new();
        scene.add_mesh(EntityId(1), &mesh, &Transform::identity());

        let mut poi = PointOfInterest::new(EntityId(1))
            .with_mesh(mesh)
            .with_viewpoint(viewpoint())
            .with_settings(EstimatorSettings::with_samples(20));
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let first = poi.evaluate(&scene, &mut rng).unwrap();
        assert_eq!(first.visibility, 1.0);

        poi.set_transform(Transform::translation(0.0, 0.0, 50.0));
        let second = poi.evaluate(&scene, &mut rng).unwrap();
        assert_eq!(second.outcome, Outcome::OutsideFrustum);
        assert_eq!(poi.last_report().map(|r| r.visibility), Some(0.0));
    }
}
