//! Frustum and backface classification.
//!
//! Classification never removes slots: an excluded triangle becomes
//! [`Classified::Excluded`] so that slot `i` still lines up with area `i`
//! of the snapshot.

use log::trace;
use sightline_math::Aabb3;

use crate::frustum::Viewpoint;
use crate::geometry::{GeometrySnapshot, Triangle};

/// Sampling eligibility of one snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified {
    /// In view and facing the viewpoint.
    Eligible(Triangle),
    /// Outside the frustum, backfacing or degenerate.
    Excluded,
}

impl Classified {
    /// The triangle, if this slot may be sampled.
    pub fn eligible(&self) -> Option<&Triangle> {
        match self {
            Classified::Eligible(tri) => Some(tri),
            Classified::Excluded => None,
        }
    }
}

/// Classified slots, same length and order as the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTriangles {
    slots: Vec<Classified>,
    eligible: usize,
}

impl ClassifiedTriangles {
    /// Build from explicit slots.
    pub fn from_slots(slots: Vec<Classified>) -> Self {
        let eligible = slots.iter().filter(|s| s.eligible().is_some()).count();
        Self { slots, eligible }
    }

    /// All slots in snapshot order.
    pub fn slots(&self) -> &[Classified] {
        &self.slots
    }

    /// Slot `i`.
    pub fn get(&self, i: usize) -> Option<&Classified> {
        self.slots.get(i)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if there are no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of eligible slots.
    pub fn eligible_count(&self) -> usize {
        self.eligible
    }
}

/// Mark each snapshot triangle as eligible or excluded for `viewpoint`.
///
/// A triangle is excluded when the cube of edge `bounds_size` around its
/// centroid is outside the frustum, or when it faces away from the viewpoint
/// (`dot(normal, normalize(v0 - eye)) >= 0`).
pub fn classify(
    snapshot: &GeometrySnapshot,
    viewpoint: &Viewpoint,
    bounds_size: f64,
) -> ClassifiedTriangles {
    let slots = snapshot
        .triangles()
        .iter()
        .enumerate()
        .map(|(i, tri)| {
            let slot = classify_one(tri, viewpoint, bounds_size);
            if slot == Classified::Excluded {
                trace!("triangle {i} excluded");
            }
            slot
        })
        .collect();
    ClassifiedTriangles::from_slots(slots)
}

fn classify_one(tri: &Triangle, viewpoint: &Viewpoint, bounds_size: f64) -> Classified {
    let volume = Aabb3::from_center_size(tri.centroid(), bounds_size);
    if !viewpoint.frustum.intersects_aabb(&volume) {
        return Classified::Excluded;
    }

    let Some(normal) = tri.cross().try_normalize(f64::EPSILON) else {
        return Classified::Excluded;
    };
    let Some(to_triangle) = (tri.v0 - viewpoint.position).try_normalize(f64::EPSILON) else {
        return Classified::Excluded;
    };

    if normal.dot(&to_triangle) < 0.0 {
        Classified::Eligible(*tri)
    } else {
        Classified::Excluded
    }
}
