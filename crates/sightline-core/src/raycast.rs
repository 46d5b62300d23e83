//! Occlusion raycasting from sampled points to the viewpoint.

use log::{trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sightline_math::{Point3, Vec3};

use crate::oracle::{IntersectionOracle, OccluderFilter, OracleError, Ray};
use crate::sampler::SurfaceSample;

/// A ray emitted for visual debugging. Never affects the result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugRay {
    /// Sample point.
    pub origin: Point3,
    /// Viewpoint minus sample point (not normalized).
    pub direction: Vec3,
}

/// Result of one segment query.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentOutcome {
    /// Nothing but the target or the viewer lies on the segment.
    Clear,
    /// Some other entity lies on the segment.
    Occluded,
    /// The oracle could not answer, even after a retry when enabled.
    Failed(OracleError),
}

/// Query the segment `from -> to`.
///
/// Returns the outcome and the number of oracle calls made. Coincident
/// endpoints are clear without a query.
pub fn query_segment<O: IntersectionOracle + ?Sized>(
    oracle: &O,
    from: Point3,
    to: Point3,
    filter: &OccluderFilter,
    retry: bool,
) -> (SegmentOutcome, usize) {
    let Some((ray, distance)) = Ray::between(from, to) else {
        return (SegmentOutcome::Clear, 0);
    };

    let mut queries = 1;
    let mut result = oracle.intersect(&ray, distance);
    if retry {
        if let Err(err) = &result {
            warn!("occlusion query from {from} failed, retrying: {err}");
            queries += 1;
            result = oracle.intersect(&ray, distance);
        }
    }

    let outcome = match result {
        Ok(hits) if filter.blocks(&hits) => SegmentOutcome::Occluded,
        Ok(_) => SegmentOutcome::Clear,
        Err(err) => {
            warn!("occlusion query from {from} failed: {err}");
            SegmentOutcome::Failed(err)
        }
    };
    (outcome, queries)
}

/// Counts gathered over one sample set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcclusionTally {
    /// Samples whose query produced an answer.
    pub evaluated: usize,
    /// Evaluated samples with an occluder in the way.
    pub occluded: usize,
    /// Samples dropped because the oracle failed.
    pub failed: usize,
    /// Oracle calls made, retries included.
    pub queries: usize,
    /// Most recent oracle failure.
    pub last_error: Option<OracleError>,
    /// One ray per queried sample, when requested.
    pub rays: Vec<DebugRay>,
}

impl OcclusionTally {
    fn record(&mut self, outcome: SegmentOutcome, queries: usize) {
        self.queries += queries;
        match outcome {
            SegmentOutcome::Clear => self.evaluated += 1,
            SegmentOutcome::Occluded => {
                self.evaluated += 1;
                self.occluded += 1;
            }
            SegmentOutcome::Failed(err) => {
                self.failed += 1;
                self.last_error = Some(err);
            }
        }
    }
}

/// Cast one segment per sample toward `eye` and tally the outcomes.
///
/// With `parallel` the queries run on the rayon pool; outcomes are folded
/// in sample order either way, so both paths give the same tally.
pub fn cast_samples<O: IntersectionOracle + ?Sized>(
    oracle: &O,
    samples: &[SurfaceSample],
    eye: Point3,
    filter: &OccluderFilter,
    retry: bool,
    draw_rays: bool,
    parallel: bool,
) -> OcclusionTally {
    let query = |sample: &SurfaceSample| query_segment(oracle, sample.point, eye, filter, retry);
    let outcomes: Vec<(SegmentOutcome, usize)> = if parallel {
        samples.par_iter().map(query).collect()
    } else {
        samples.iter().map(query).collect()
    };

    let mut tally = OcclusionTally::default();
    for (sample, (outcome, queries)) in samples.iter().zip(outcomes) {
        trace!("sample {} -> {:?}", sample.point, outcome);
        if draw_rays && queries > 0 {
            tally.rays.push(DebugRay {
                origin: sample.point,
                direction: eye - sample.point,
            });
        }
        tally.record(outcome, queries);
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;
    use crate::oracle::{EntityId, Hit};
    use crate::scene::TriangleScene;
    use sightline_math::Transform;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TARGET: EntityId = EntityId(1);
    const WALL: EntityId = EntityId(2);
    const VIEWER: EntityId = EntityId(3);

    fn filter() -> OccluderFilter {
        OccluderFilter {
            target: TARGET,
            viewpoint: Some(VIEWER),
        }
    }

    /// A wall at z = 5 covering x in [-2, 2], y in [-2, 2].
    fn wall() -> TriangleScene {
        let mut scene = TriangleScene::new();
        scene.add_mesh(WALL, &TriangleMesh::quad(4.0, 4.0), &Transform::translation(0.0, 0.0, 5.0));
        scene
    }

    fn sample(x: f64, y: f64, z: f64) -> SurfaceSample {
        SurfaceSample {
            point: Point3::new(x, y, z),
            triangle: 0,
        }
    }

    /// Fails the first `failures` calls, then reports a hit on the wall.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl IntersectionOracle for Flaky {
        fn intersect(&self, _ray: &Ray, _max: f64) -> Result<Vec<Hit>, OracleError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(OracleError("busy".into()))
            } else {
                Ok(vec![Hit {
                    entity: WALL,
                    distance: 1.0,
                }])
            }
        }
    }

    #[test]
    fn test_blocked_and_clear_samples() {
        let scene = wall();
        let eye = Point3::new(0.0, 0.0, 10.0);
        let samples = [sample(0.0, 0.0, 0.0), sample(10.0, 0.0, 0.0), sample(0.5, 0.5, 0.0)];
        let tally = cast_samples(&scene, &samples, eye, &filter(), true, false, false);
        assert_eq!(tally.evaluated, 3);
        assert_eq!(tally.occluded, 2);
        assert_eq!(tally.queries, 3);
        assert!(tally.rays.is_empty());
    }

    #[test]
    fn test_target_and_viewer_hits_ignored() {
        let mut scene = TriangleScene::new();
        let quad = TriangleMesh::quad(4.0, 4.0);
        scene.add_mesh(TARGET, &quad, &Transform::translation(0.0, 0.0, 5.0));
        scene.add_mesh(VIEWER, &quad, &Transform::translation(0.0, 0.0, 8.0));
        let eye = Point3::new(0.0, 0.0, 10.0);
        let samples = [sample(0.0, 0.0, 0.0)];
        let tally = cast_samples(&scene, &samples, eye, &filter(), true, false, false);
        assert_eq!(tally.occluded, 0);
        assert_eq!(tally.evaluated, 1);
    }

    #[test]
    fn test_sample_at_viewpoint_is_clear() {
        let scene = wall();
        let eye = Point3::new(1.0, 1.0, 1.0);
        let samples = [sample(1.0, 1.0, 1.0)];
        let tally = cast_samples(&scene, &samples, eye, &filter(), true, true, false);
        assert_eq!(tally.evaluated, 1);
        assert_eq!(tally.occluded, 0);
        assert_eq!(tally.queries, 0);
        assert!(tally.rays.is_empty());
    }

    #[test]
    fn test_debug_rays() {
        let scene = wall();
        let eye = Point3::new(0.0, 0.0, 10.0);
        let samples = [sample(0.0, 0.0, 0.0), sample(3.0, 0.0, 0.0)];
        let with = cast_samples(&scene, &samples, eye, &filter(), true, true, false);
        let without = cast_samples(&scene, &samples, eye, &filter(), true, false, false);
        assert_eq!(with.rays.len(), 2);
        assert_eq!(with.rays[1].origin, Point3::new(3.0, 0.0, 0.0));
        assert_eq!(with.rays[1].direction, Vec3::new(-3.0, 0.0, 10.0));
        assert_eq!(with.occluded, without.occluded);
        assert_eq!(with.evaluated, without.evaluated);
    }

    #[test]
    fn test_retry_recovers() {
        let oracle = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let (outcome, queries) =
            query_segment(&oracle, Point3::origin(), Point3::new(0.0, 0.0, 1.0), &filter(), true);
        assert_eq!(outcome, SegmentOutcome::Occluded);
        assert_eq!(queries, 2);
    }

    #[test]
    fn test_failure_without_retry() {
        let oracle = Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let (outcome, queries) =
            query_segment(&oracle, Point3::origin(), Point3::new(0.0, 0.0, 1.0), &filter(), false);
        assert!(matches!(outcome, SegmentOutcome::Failed(_)));
        assert_eq!(queries, 1);
    }

    #[test]
    fn test_failed_samples_leave_denominator() {
        let oracle = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let eye = Point3::new(0.0, 0.0, 10.0);
        let samples = [sample(0.0, 0.0, 0.0), sample(1.0, 0.0, 0.0)];
        let tally = cast_samples(&oracle, &samples, eye, &filter(), true, false, false);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.evaluated, 1);
        assert_eq!(tally.occluded, 1);
        assert_eq!(tally.queries, 3);
        assert_eq!(tally.last_error, Some(OracleError("busy".into())));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let scene = wall();
        let eye = Point3::new(0.0, 0.0, 10.0);
        let samples: Vec<_> = (0..64)
            .map(|i| sample(i as f64 * 0.2 - 6.4, 0.3, 0.0))
            .collect();
        let serial = cast_samples(&scene, &samples, eye, &filter(), true, true, false);
        let parallel = cast_samples(&scene, &samples, eye, &filter(), true, true, true);
        assert_eq!(serial, parallel);
        assert!(serial.occluded > 0 && serial.occluded < 64);
    }
}
