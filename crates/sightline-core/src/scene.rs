//! Brute-force triangle-soup oracle.
//!
//! Each entity is a world-space triangle list with a cached bounding box.
//! A query slab-tests every entity box and then runs Möller–Trumbore on the
//! triangles of the boxes it enters. No spatial index beyond that.

use sightline_math::{Aabb3, Tolerance, Transform};

use crate::geometry::Triangle;
use crate::mesh::TriangleMesh;
use crate::oracle::{EntityId, Hit, IntersectionOracle, OracleError, Ray};

#[derive(Debug, Clone)]
struct SceneEntity {
    id: EntityId,
    triangles: Vec<Triangle>,
    aabb: Aabb3,
}

/// A set of entities made of world-space triangles.
#[derive(Debug, Clone, Default)]
pub struct TriangleScene {
    entities: Vec<SceneEntity>,
    tolerance: Tolerance,
}

impl TriangleScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity from a local-space mesh and its object-to-world transform.
    ///
    /// Faces with out-of-range indices are skipped.
    pub fn add_mesh(&mut self, id: EntityId, mesh: &TriangleMesh, transform: &Transform) {
        let n = mesh.positions.len();
        let triangles = mesh
            .indices
            .iter()
            .filter(|tri| tri.iter().all(|&i| (i as usize) < n))
            .map(|&[a, b, c]| {
                Triangle::new(
                    transform.apply_point(&mesh.positions[a as usize]),
                    transform.apply_point(&mesh.positions[b as usize]),
                    transform.apply_point(&mesh.positions[c as usize]),
                )
            })
            .collect();
        self.add_triangles(id, triangles);
    }

    /// Add an entity from world-space triangles.
    pub fn add_triangles(&mut self, id: EntityId, triangles: Vec<Triangle>) {
        let mut aabb = Aabb3::from_points(triangles.iter().flat_map(|t| [&t.v0, &t.v1, &t.v2]));
        aabb.expand(self.tolerance.linear);
        self.entities.push(SceneEntity { id, triangles, aabb });
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the scene holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl IntersectionOracle for TriangleScene {
    fn intersect(&self, ray: &Ray, max_distance: f64) -> Result<Vec<Hit>, OracleError> {
        if !max_distance.is_finite() || max_distance < 0.0 {
            return Err(OracleError(format!("invalid max distance {max_distance}")));
        }

        let eps = self.tolerance.linear;
        let mut hits = Vec::new();
        for entity in &self.entities {
            if !segment_enters_box(ray, max_distance, &entity.aabb) {
                continue;
            }
            for tri in &entity.triangles {
                if let Some(t) = intersect_triangle(ray, tri, eps) {
                    if t > eps && t <= max_distance {
                        hits.push(Hit {
                            entity: entity.id,
                            distance: t,
                        });
                    }
                }
            }
        }
        Ok(hits)
    }
}

/// Slab test of the segment `[0, max_distance]` along `ray` against `aabb`.
fn segment_enters_box(ray: &Ray, max_distance: f64, aabb: &Aabb3) -> bool {
    let mut near = 0.0_f64;
    let mut far = max_distance;
    for axis in 0..3 {
        let o = ray.origin[axis];
        let d = ray.direction[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
        if d == 0.0 {
            if o < lo || o > hi {
                return false;
            }
            continue;
        }
        let (t0, t1) = ((lo - o) / d, (hi - o) / d);
        near = near.max(t0.min(t1));
        far = far.min(t0.max(t1));
        if near > far {
            return false;
        }
    }
    true
}

/// Two-sided Möller–Trumbore. Returns the ray parameter of the hit.
fn intersect_triangle(ray: &Ray, tri: &Triangle, eps: f64) -> Option<f64> {
    let dir = ray.direction.as_ref();
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < eps * eps {
        // Parallel to the triangle plane.
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - tri.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    Some(f * edge2.dot(&q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_math::{Point3, Vec3};

    fn wall_scene() -> TriangleScene {
        let mut scene = TriangleScene::new();
        scene.add_mesh(
            EntityId(1),
            &TriangleMesh::quad(4.0, 4.0),
            &Transform::translation(0.0, 0.0, 5.0),
        );
        scene
    }

    #[test]
    fn test_hit_both_sides() {
        let scene = wall_scene();
        // Off the quad's shared diagonal, so exactly one triangle is crossed.
        let front = Ray::new(Point3::new(0.3, -0.2, 0.0), Vec3::z());
        let back = Ray::new(Point3::new(0.3, -0.2, 10.0), -Vec3::z());
        let hits = scene.intersect(&front, 100.0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].entity, EntityId(1));
        assert!((hits[0].distance - 5.0).abs() < 1e-9);
        assert_eq!(scene.intersect(&back, 100.0).unwrap().len(), 1);
    }

    #[test]
    fn test_segment_stops_short() {
        let scene = wall_scene();
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::z());
        assert!(scene.intersect(&ray, 4.9).unwrap().is_empty());
    }

    #[test]
    fn test_miss_outside_quad() {
        let scene = wall_scene();
        let ray = Ray::new(Point3::new(3.0, 0.0, 0.0), Vec3::z());
        assert!(scene.intersect(&ray, 100.0).unwrap().is_empty());
    }

    #[test]
    fn test_origin_on_surface_is_ignored() {
        let scene = wall_scene();
        let ray = Ray::new(Point3::new(0.5, 0.5, 5.0), Vec3::z());
        assert!(scene.intersect(&ray, 100.0).unwrap().is_empty());
    }

    #[test]
    fn test_cube_reports_entry_and_exit() {
        let mut scene = TriangleScene::new();
        let cube = TriangleMesh::cube(2.0, 2.0, 2.0);
        scene.add_mesh(EntityId(9), &cube, &Transform::identity());
        let ray = Ray::new(Point3::new(0.1, 0.2, -5.0), Vec3::z());
        let hits = scene.intersect(&ray, 100.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.entity == EntityId(9)));
    }

    #[test]
    fn test_shared_edge_may_report_twice() {
        let scene = wall_scene();
        let ray = Ray::new(Point3::origin(), Vec3::z());
        let hits = scene.intersect(&ray, 100.0).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.entity == EntityId(1)));
        assert!(hits.iter().all(|h| (h.distance - 5.0).abs() < 1e-9));
    }

    #[test]
    fn test_segment_box_test() {
        let aabb = Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let toward = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::x());
        assert!(segment_enters_box(&toward, 10.0, &aabb));
        assert!(!segment_enters_box(&toward, 4.0, &aabb));

        let away = Ray::new(Point3::new(-5.0, 0.5, 0.5), -Vec3::x());
        assert!(!segment_enters_box(&away, 100.0, &aabb));

        let beside = Ray::new(Point3::new(-5.0, 5.0, 0.5), Vec3::x());
        assert!(!segment_enters_box(&beside, 100.0, &aabb));

        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0));
        assert!(segment_enters_box(&inside, 0.1, &aabb));
    }

    #[test]
    fn test_invalid_distance() {
        let scene = wall_scene();
        let ray = Ray::new(Point3::origin(), Vec3::z());
        assert!(scene.intersect(&ray, f64::NAN).is_err());
    }
}
