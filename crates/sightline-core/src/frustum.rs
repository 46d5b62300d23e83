//! View frustum planes, cameras and viewpoints.

use nalgebra::{Isometry3, Perspective3};
use sightline_math::{Aabb3, Mat4, Point3, Vec3};

use crate::error::{Result, VisibilityError};
use crate::oracle::EntityId;

/// A plane `normal · p + d = 0`; the positive side is "inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum.
    pub normal: Vec3,
    /// Offset from the origin along the normal.
    pub d: f64,
}

impl Plane {
    /// Build a plane from raw coefficients `(a, b, c, d)`, normalizing them.
    fn from_coefficients(a: f64, b: f64, c: f64, d: f64) -> Self {
        let normal = Vec3::new(a, b, c);
        let len = normal.norm().max(1e-12);
        Self {
            normal: normal / len,
            d: d / len,
        }
    }

    /// Signed distance from `p`; positive means inside.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) + self.d
    }
}

/// Six planes bounding what a viewpoint can see.
///
/// Order: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// The bounding planes, normals facing inward.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract the planes from a combined view-projection matrix.
    ///
    /// Expects OpenGL-style clip space (`-w <= z <= w`), which is what
    /// [`Perspective3`] produces.
    pub fn from_view_projection(m: &Mat4) -> Self {
        let row = |i: usize| m.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let plane = |v: nalgebra::Vector4<f64>| Plane::from_coefficients(v.x, v.y, v.z, v.w);

        Self {
            planes: [
                plane(r3 + r0),
                plane(r3 - r0),
                plane(r3 + r1),
                plane(r3 - r1),
                plane(r3 + r2),
                plane(r3 - r2),
            ],
        }
    }

    /// Conservative box test: false only if the box lies entirely outside
    /// at least one plane.
    pub fn intersects_aabb(&self, aabb: &Aabb3) -> bool {
        if aabb.is_empty() {
            return false;
        }
        self.planes.iter().all(|plane| {
            let p = aabb.positive_vertex(&plane.normal);
            plane.signed_distance(&p) >= 0.0
        })
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub eye: Point3,
    /// Point the camera looks at.
    pub target: Point3,
    /// Up hint.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f64,
    /// Width / height.
    pub aspect: f64,
    /// Near clip distance.
    pub near: f64,
    /// Far clip distance.
    pub far: f64,
}

impl Camera {
    /// Camera at `eye` looking at `target` with Y up and a 60° 16:9 lens.
    pub fn looking_at(eye: Point3, target: Point3) -> Self {
        Self {
            eye,
            target,
            up: Vec3::y(),
            fov_y_deg: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Reject parameters that cannot form a frustum.
    pub fn validate(&self) -> Result<()> {
        if !(self.fov_y_deg > 0.0 && self.fov_y_deg < 180.0) {
            return Err(VisibilityError::InvalidCamera(format!(
                "fov_y_deg must be in (0, 180), got {}",
                self.fov_y_deg
            )));
        }
        if !(self.aspect > 0.0 && self.aspect.is_finite()) {
            return Err(VisibilityError::InvalidCamera(format!(
                "aspect must be positive and finite, got {}",
                self.aspect
            )));
        }
        if !(self.near > 0.0 && self.far > self.near && self.far.is_finite()) {
            return Err(VisibilityError::InvalidCamera(format!(
                "need 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        let forward = self.target - self.eye;
        if forward.norm() < 1e-12 || forward.cross(&self.up).norm() < 1e-12 {
            return Err(VisibilityError::InvalidCamera(
                "view direction is degenerate or parallel to up".into(),
            ));
        }
        Ok(())
    }

    /// Combined projection * view matrix.
    pub fn view_projection(&self) -> Mat4 {
        let view = Isometry3::look_at_rh(&self.eye, &self.target, &self.up);
        let proj = Perspective3::new(self.aspect, self.fov_y_deg.to_radians(), self.near, self.far);
        proj.to_homogeneous() * view.to_homogeneous()
    }

    /// Frustum of this camera.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// Validate and turn this camera into a [`Viewpoint`].
    pub fn viewpoint(&self) -> Result<Viewpoint> {
        self.validate()?;
        Ok(Viewpoint::new(self.eye, self.frustum()))
    }
}

/// Where visibility is evaluated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewpoint {
    /// Eye position; rays end here.
    pub position: Point3,
    /// Planes of the view volume.
    pub frustum: Frustum,
    /// Collision entity belonging to the viewpoint itself, if any.
    /// Hits on it never count as occlusion.
    pub entity: Option<EntityId>,
}

impl Viewpoint {
    /// Viewpoint without collision geometry of its own.
    pub fn new(position: Point3, frustum: Frustum) -> Self {
        Self {
            position,
            frustum,
            entity: None,
        }
    }

    /// Attach the viewpoint's own collision entity.
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }
}
