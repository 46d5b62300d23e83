#![warn(missing_docs)]

//! JSON scene documents for sightline.
//!
//! A [`Scene`] names one target object, a camera and a flat list of
//! objects, each a primitive or an explicit mesh with a transform. The
//! document is purely declarative; [`Scene::resolve`] turns it into the
//! meshes, transforms, entity ids and viewpoint the estimator consumes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sightline_core::{Camera, EntityId, TriangleMesh, Viewpoint, VisibilityError};
use sightline_math::{Point3, Transform, Vec3};
use thiserror::Error;

/// Errors raised while reading or resolving a scene document.
#[derive(Error, Debug)]
pub enum IrError {
    /// The document is not valid JSON for this schema.
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    /// Two objects share an id.
    #[error("duplicate object id: {0}")]
    DuplicateId(String),

    /// The target names no object.
    #[error("target object not found: {0}")]
    UnknownTarget(String),

    /// A primitive has out-of-range parameters.
    #[error("invalid geometry for {id}: {reason}")]
    InvalidGeometry {
        /// Object id.
        id: String,
        /// What is wrong.
        reason: String,
    },

    /// The camera or a mesh was rejected by the estimator types.
    #[error(transparent)]
    Visibility(#[from] VisibilityError),
}

/// Result type for scene documents.
pub type Result<T> = std::result::Result<T, IrError>;

/// Object geometry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Explicit triangle mesh in local space.
    Mesh {
        /// Vertex positions.
        positions: Vec<[f64; 3]>,
        /// Triangle index triples, counter-clockwise seen from outside.
        indices: Vec<[u32; 3]>,
    },
    /// Axis-aligned box centred at the origin.
    Cube {
        /// Size along each axis.
        size: [f64; 3],
    },
    /// UV sphere centred at the origin.
    Sphere {
        /// Radius of the sphere.
        radius: f64,
        /// Number of slices around the Y axis.
        #[serde(default = "default_segments")]
        segments: u32,
    },
    /// Rectangle in the XY plane facing +Z.
    Quad {
        /// Extent along X.
        width: f64,
        /// Extent along Y.
        height: f64,
    },
}

fn default_segments() -> u32 {
    24
}

impl Geometry {
    /// Build the local-space mesh.
    pub fn to_mesh(&self) -> TriangleMesh {
        match self {
            Geometry::Mesh { positions, indices } => TriangleMesh::new(
                positions.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect(),
                indices.clone(),
            ),
            Geometry::Cube { size } => TriangleMesh::cube(size[0], size[1], size[2]),
            Geometry::Sphere { radius, segments } => TriangleMesh::uv_sphere(*radius, *segments),
            Geometry::Quad { width, height } => TriangleMesh::quad(*width, *height),
        }
    }

    fn check(&self, id: &str) -> Result<()> {
        let invalid = |reason: &str| IrError::InvalidGeometry {
            id: id.to_string(),
            reason: reason.to_string(),
        };
        let positive = |v: f64| v > 0.0 && v.is_finite();
        match self {
            Geometry::Mesh { .. } => {
                self.to_mesh().validate()?;
            }
            Geometry::Cube { size } => {
                if !size.iter().all(|&s| positive(s)) {
                    return Err(invalid("cube size must be positive"));
                }
            }
            Geometry::Sphere { radius, segments } => {
                if !positive(*radius) {
                    return Err(invalid("sphere radius must be positive"));
                }
                if *segments < 3 {
                    return Err(invalid("sphere needs at least 3 segments"));
                }
            }
            Geometry::Quad { width, height } => {
                if !positive(*width) || !positive(*height) {
                    return Err(invalid("quad extents must be positive"));
                }
            }
        }
        Ok(())
    }
}

/// Placement of an object in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectTransform {
    /// Translation.
    pub translation: [f64; 3],
    /// Euler angles in degrees, applied X first, then Y, then Z.
    pub rotation_deg: [f64; 3],
    /// Scale factors per axis.
    pub scale: [f64; 3],
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation_deg: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl ObjectTransform {
    /// The object-to-world matrix.
    pub fn to_transform(&self) -> Transform {
        let [rx, ry, rz] = self.rotation_deg;
        Transform::from_trs(
            Vec3::from(self.translation),
            Vec3::new(rx.to_radians(), ry.to_radians(), rz.to_radians()),
            Vec3::from(self.scale),
        )
    }
}

/// One object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Unique id within the document.
    pub id: String,
    /// Shape in local space.
    pub geometry: Geometry,
    /// Placement.
    #[serde(default)]
    pub transform: ObjectTransform,
}

/// Sphere around the eye treated as the viewer's own body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerCollider {
    /// Sphere radius.
    pub radius: f64,
}

/// Perspective camera description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDef {
    /// Eye position.
    pub eye: [f64; 3],
    /// Point looked at.
    pub target: [f64; 3],
    /// Up hint.
    #[serde(default = "default_up")]
    pub up: [f64; 3],
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_y_deg: f64,
    /// Width / height.
    #[serde(default = "default_aspect")]
    pub aspect: f64,
    /// Near clip distance.
    #[serde(default = "default_near")]
    pub near: f64,
    /// Far clip distance.
    #[serde(default = "default_far")]
    pub far: f64,
    /// Optional viewer body.
    #[serde(default)]
    pub collider: Option<ViewerCollider>,
}

fn default_up() -> [f64; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fov() -> f64 {
    60.0
}

fn default_aspect() -> f64 {
    16.0 / 9.0
}

fn default_near() -> f64 {
    0.1
}

fn default_far() -> f64 {
    1000.0
}

impl CameraDef {
    /// Camera at `eye` looking at `target` with default lens settings.
    pub fn looking_at(eye: [f64; 3], target: [f64; 3]) -> Self {
        Self {
            eye,
            target,
            up: default_up(),
            fov_y_deg: default_fov(),
            aspect: default_aspect(),
            near: default_near(),
            far: default_far(),
            collider: None,
        }
    }

    /// Convert to an estimator camera.
    pub fn to_camera(&self) -> Camera {
        Camera {
            eye: Point3::from(self.eye),
            target: Point3::from(self.target),
            up: Vec3::from(self.up),
            fov_y_deg: self.fov_y_deg,
            aspect: self.aspect,
            near: self.near,
            far: self.far,
        }
    }
}

/// A sightline scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Format version string (e.g. "0.1").
    pub version: String,
    /// Id of the object whose visibility is measured.
    pub target: String,
    /// Where the scene is viewed from.
    pub camera: CameraDef,
    /// Every object, target included.
    pub objects: Vec<SceneObject>,
}

/// A scene ready for estimation.
#[derive(Debug, Clone)]
pub struct ResolvedScene {
    /// Target entity.
    pub target: EntityId,
    /// Target mesh in local space.
    pub target_mesh: TriangleMesh,
    /// Target object-to-world transform.
    pub target_transform: Transform,
    /// Every object as `(entity, local mesh, transform)`, in document order.
    pub objects: Vec<(EntityId, TriangleMesh, Transform)>,
    /// Viewpoint built from the camera.
    pub viewpoint: Viewpoint,
    /// Viewer entity and radius, when the camera has a collider.
    pub viewer: Option<(EntityId, f64)>,
}

impl Scene {
    /// Scene with only a target object and a camera.
    pub fn new(target: SceneObject, camera: CameraDef) -> Self {
        Self {
            version: "0.1".to_string(),
            target: target.id.clone(),
            camera,
            objects: vec![target],
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let scene: Self = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Object with the given id.
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Entity id assigned to object `id`: its position in `objects`.
    pub fn entity_id(&self, id: &str) -> Option<EntityId> {
        self.objects
            .iter()
            .position(|o| o.id == id)
            .map(|i| EntityId(i as u64))
    }

    /// Entity id reserved for the viewer's collider.
    pub fn viewer_entity(&self) -> EntityId {
        EntityId(self.objects.len() as u64)
    }

    /// Check ids, the target reference and primitive parameters.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for object in &self.objects {
            if !seen.insert(object.id.as_str()) {
                return Err(IrError::DuplicateId(object.id.clone()));
            }
            object.geometry.check(&object.id)?;
        }
        if self.object(&self.target).is_none() {
            return Err(IrError::UnknownTarget(self.target.clone()));
        }
        if let Some(collider) = &self.camera.collider {
            if !(collider.radius > 0.0 && collider.radius.is_finite()) {
                return Err(IrError::InvalidGeometry {
                    id: "camera".to_string(),
                    reason: "collider radius must be positive".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate and convert into estimator inputs.
    pub fn resolve(&self) -> Result<ResolvedScene> {
        self.validate()?;

        let objects: Vec<_> = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| {
                (
                    EntityId(i as u64),
                    o.geometry.to_mesh(),
                    o.transform.to_transform(),
                )
            })
            .collect();

        let target = self
            .entity_id(&self.target)
            .ok_or_else(|| IrError::UnknownTarget(self.target.clone()))?;
        let (_, target_mesh, target_transform) = objects[target.0 as usize].clone();

        let viewer = self
            .camera
            .collider
            .map(|c| (self.viewer_entity(), c.radius));
        let mut viewpoint = self.camera.to_camera().viewpoint()?;
        if let Some((entity, _)) = viewer {
            viewpoint = viewpoint.with_entity(entity);
        }

        Ok(ResolvedScene {
            target,
            target_mesh,
            target_transform,
            objects,
            viewpoint,
            viewer,
        })
    }
}
