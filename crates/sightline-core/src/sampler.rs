//! Stochastic surface sampling.
//!
//! Triangle selection maps a uniform draw to a snapshot slot. Area-weighted
//! draws search cumulative areas where excluded slots add nothing, so every
//! draw lands on an eligible triangle. Index remapping spreads draws over
//! every slot and redraws excluded ones. Points inside the chosen triangle are
//! drawn with folded barycentric coordinates.

use log::trace;
use rand::Rng;
use sightline_math::Point3;

use crate::classify::ClassifiedTriangles;
use crate::config::SamplingStrategy;
use crate::error::{Result, VisibilityError};
use crate::geometry::Triangle;

/// One sampled surface point and the slot it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// World-space point on the surface.
    pub point: Point3,
    /// Snapshot slot of the source triangle.
    pub triangle: usize,
}

/// Sampled points for one cycle, in draw order.
pub type SampleSet = Vec<SurfaceSample>;

/// Draws eligible triangle slots.
#[derive(Debug, Clone)]
pub struct TriangleSampler<'a> {
    classified: &'a ClassifiedTriangles,
    /// Running sum of eligible areas, one entry per slot.
    cumulative: Vec<f64>,
    /// Upper bound of a draw.
    range: f64,
    strategy: SamplingStrategy,
    max_attempts: usize,
}

impl<'a> TriangleSampler<'a> {
    /// Prepare a sampler over `classified` weighted by `areas`.
    ///
    /// Draws fall in `[0, eligible area)` for [`SamplingStrategy::AreaWeighted`]
    /// and in `[0, total area)` for [`SamplingStrategy::IndexRemap`]. Returns
    /// `None` when that range is empty or nothing is eligible.
    pub fn new(
        classified: &'a ClassifiedTriangles,
        areas: &[f64],
        strategy: SamplingStrategy,
        max_attempts: usize,
    ) -> Option<Self> {
        debug_assert_eq!(classified.len(), areas.len());
        if classified.eligible_count() == 0 {
            return None;
        }

        let mut cumulative = Vec::with_capacity(areas.len());
        let mut eligible_area = 0.0;
        let mut total_area = 0.0;
        for (slot, &area) in classified.slots().iter().zip(areas) {
            let area = area.max(0.0);
            total_area += area;
            if slot.eligible().is_some() {
                eligible_area += area;
            }
            cumulative.push(eligible_area);
        }

        let range = match strategy {
            SamplingStrategy::AreaWeighted => eligible_area,
            SamplingStrategy::IndexRemap => total_area,
        };
        if !(range > 0.0) || !range.is_finite() {
            return None;
        }

        Some(Self {
            classified,
            cumulative,
            range,
            strategy,
            max_attempts,
        })
    }

    /// Upper bound of a draw passed to [`Self::slot_for`].
    pub fn range(&self) -> f64 {
        self.range
    }

    /// Map a draw `r` in `[0, range)` to a slot index.
    pub fn slot_for(&self, r: f64) -> usize {
        let last = self.cumulative.len() - 1;
        let index = match self.strategy {
            SamplingStrategy::AreaWeighted => self.cumulative.partition_point(|&c| c <= r),
            SamplingStrategy::IndexRemap => {
                let t = r / self.range;
                (t * last as f64).round() as usize
            }
        };
        index.min(last)
    }

    /// Draw an eligible slot and its triangle.
    ///
    /// Area-weighted draws are accepted on the first try. Index remapping
    /// gives up after `max_attempts` consecutive excluded slots.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(usize, Triangle)> {
        for _ in 0..self.max_attempts {
            let r = rng.gen_range(0.0..self.range);
            let index = self.slot_for(r);
            if let Some(tri) = self.classified.get(index).and_then(|s| s.eligible()) {
                return Ok((index, *tri));
            }
        }
        Err(VisibilityError::SamplingExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Uniform point inside `tri`.
pub fn sample_point_in_triangle<R: Rng + ?Sized>(tri: &Triangle, rng: &mut R) -> Point3 {
    let mut r1: f64 = rng.gen();
    let mut r2: f64 = rng.gen();
    if r1 + r2 > 1.0 {
        r1 = 1.0 - r1;
        r2 = 1.0 - r2;
    }
    tri.v0 + r1 * (tri.v1 - tri.v0) + r2 * (tri.v2 - tri.v0)
}

/// Draw `count` surface samples.
pub fn collect_samples<R: Rng + ?Sized>(
    sampler: &TriangleSampler<'_>,
    count: usize,
    rng: &mut R,
) -> Result<SampleSet> {
    let mut samples = Vec::with_capacity(count);
    for _ in 0..count {
        let (triangle, tri) = sampler.draw(rng)?;
        let point = sample_point_in_triangle(&tri, rng);
        trace!("sample on triangle {triangle}: {point}");
        samples.push(SurfaceSample { point, triangle });
    }
    Ok(samples)
}
