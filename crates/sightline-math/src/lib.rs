#![warn(missing_docs)]

//! Math types for the sightline visibility estimator.
//!
//! nalgebra aliases plus the object-to-world [`Transform`], the [`Aabb3`]
//! used by the frustum gate and corner probe, and the [`Tolerance`] the
//! triangle oracle works with.

mod bbox;

pub use bbox::Aabb3;

use nalgebra::{Matrix4, Rotation3, Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A homogeneous 4x4 matrix.
pub type Mat4 = Matrix4<f64>;

/// Object-to-world affine transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: Mat4,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Mat4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Mat4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz)),
        }
    }

    /// Scale, then rotate by Euler angles in radians (about X, then Y, then
    /// Z), then translate.
    pub fn from_trs(translation: Vec3, euler: Vec3, scale: Vec3) -> Self {
        let rotation = Rotation3::from_euler_angles(euler.x, euler.y, euler.z);
        Self {
            matrix: Mat4::new_translation(&translation)
                * rotation.to_homogeneous()
                * Mat4::new_nonuniform_scaling(&scale),
        }
    }

    /// `self * other`: applies `other` first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Map a point from object to world space.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        self.matrix.transform_point(p)
    }
}

/// Distance below which two things are treated as touching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear tolerance in world units.
    pub linear: f64,
}

impl Tolerance {
    /// 1e-9 world units.
    pub const DEFAULT: Self = Self { linear: 1e-9 };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
