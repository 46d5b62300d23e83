//! One evaluation cycle, end to end.
//!
//! ```text
//! mesh + transform -> snapshot -> frustum gate -> corner probe
//!     -> classify -> sample -> raycast -> visibility
//! ```
//!
//! Every stage is recomputed from scratch; nothing survives the call.

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sightline_math::Transform;

use crate::classify::classify;
use crate::config::EstimatorSettings;
use crate::error::{Result, VisibilityError};
use crate::frustum::Viewpoint;
use crate::geometry::{build_snapshot, GeometrySnapshot};
use crate::mesh::TriangleMesh;
use crate::oracle::{EntityId, IntersectionOracle, OccluderFilter, OracleError};
use crate::raycast::{cast_samples, query_segment, DebugRay, SegmentOutcome};
use crate::sampler::{collect_samples, TriangleSampler};

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The object's bounds miss the view frustum.
    OutsideFrustum,
    /// Every bounding-box corner is hidden from the viewpoint.
    RoughlyOccluded,
    /// No triangle is both in view and facing the viewpoint.
    NoEligibleTriangles,
    /// Surface samples were raycast.
    Sampled,
}

/// Visibility of one object from one viewpoint, with diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    /// Fraction of evaluated samples with a clear line of sight, in `[0, 1]`.
    pub visibility: f64,
    /// Stage that decided the result.
    pub outcome: Outcome,
    /// Samples whose occlusion query succeeded.
    pub samples_evaluated: usize,
    /// Evaluated samples that were blocked.
    pub samples_occluded: usize,
    /// Samples dropped because the oracle failed.
    pub failed_queries: usize,
    /// Triangles eligible for sampling.
    pub eligible_triangles: usize,
    /// Oracle calls made, including corner probes and retries.
    pub oracle_queries: usize,
    /// Sample-to-viewpoint rays, present only when `draw_rays` is set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug_rays: Vec<DebugRay>,
}

impl VisibilityReport {
    fn invisible(outcome: Outcome, oracle_queries: usize) -> Self {
        Self {
            visibility: 0.0,
            outcome,
            samples_evaluated: 0,
            samples_occluded: 0,
            failed_queries: 0,
            eligible_triangles: 0,
            oracle_queries,
            debug_rays: Vec::new(),
        }
    }

    /// Visibility as a percentage readout, e.g. `"73.5%"`.
    pub fn label(&self) -> String {
        format!("{:.1}%", self.visibility * 100.0)
    }

    /// True if any part of the object was seen.
    pub fn is_visible(&self) -> bool {
        self.visibility > 0.0
    }
}

/// Estimate how much of `mesh` is visible from `viewpoint`.
///
/// `target` is the object's own entity in `oracle`; hits on it (and on the
/// viewpoint's entity) never count as occlusion.
pub fn estimate_visibility<O, R>(
    mesh: &TriangleMesh,
    transform: &Transform,
    target: EntityId,
    viewpoint: &Viewpoint,
    settings: &EstimatorSettings,
    oracle: &O,
    rng: &mut R,
) -> Result<VisibilityReport>
where
    O: IntersectionOracle + ?Sized,
    R: Rng + ?Sized,
{
    settings.validate()?;
    let snapshot = build_snapshot(mesh, transform)?;
    estimate_snapshot(&snapshot, target, viewpoint, settings, oracle, rng)
}

/// Same as [`estimate_visibility`] for an already built snapshot.
pub fn estimate_snapshot<O, R>(
    snapshot: &GeometrySnapshot,
    target: EntityId,
    viewpoint: &Viewpoint,
    settings: &EstimatorSettings,
    oracle: &O,
    rng: &mut R,
) -> Result<VisibilityReport>
where
    O: IntersectionOracle + ?Sized,
    R: Rng + ?Sized,
{
    settings.validate()?;

    if snapshot.is_empty() {
        debug!("{target}: no triangles");
        return Ok(VisibilityReport::invisible(Outcome::NoEligibleTriangles, 0));
    }

    if !viewpoint.frustum.intersects_aabb(snapshot.bounds()) {
        debug!("{target}: bounds outside frustum");
        return Ok(VisibilityReport::invisible(Outcome::OutsideFrustum, 0));
    }

    let filter = OccluderFilter {
        target,
        viewpoint: viewpoint.entity,
    };

    let (corners_hidden, mut queries) =
        probe_corners(snapshot, viewpoint, &filter, settings, oracle);
    if corners_hidden {
        debug!("{target}: all bounding-box corners occluded");
        return Ok(VisibilityReport::invisible(Outcome::RoughlyOccluded, queries));
    }

    let classified = classify(snapshot, viewpoint, settings.triangle_bounds_size);
    let eligible = classified.eligible_count();
    let Some(sampler) = TriangleSampler::new(
        &classified,
        snapshot.areas(),
        settings.sampling,
        settings.max_draw_attempts,
    ) else {
        debug!("{target}: no eligible triangles");
        return Ok(VisibilityReport::invisible(Outcome::NoEligibleTriangles, queries));
    };

    let samples = collect_samples(&sampler, settings.sample_count, rng)?;
    let tally = cast_samples(
        oracle,
        &samples,
        viewpoint.position,
        &filter,
        settings.retry_failed_queries,
        settings.draw_rays,
        settings.parallel,
    );
    queries += tally.queries;

    if tally.evaluated == 0 {
        let source = tally
            .last_error
            .unwrap_or_else(|| OracleError("no sample was evaluated".into()));
        return Err(VisibilityError::Oracle {
            samples: samples.len(),
            source,
        });
    }
    if tally.failed > 0 {
        warn!(
            "{target}: dropped {} of {} samples after oracle failures",
            tally.failed,
            samples.len()
        );
    }

    let visible = tally.evaluated - tally.occluded;
    let visibility = visible as f64 / tally.evaluated as f64;
    debug!(
        "{target}: {visible}/{} samples visible over {eligible} eligible triangles, area {:.4}",
        tally.evaluated,
        snapshot.total_area()
    );

    Ok(VisibilityReport {
        visibility,
        outcome: Outcome::Sampled,
        samples_evaluated: tally.evaluated,
        samples_occluded: tally.occluded,
        failed_queries: tally.failed,
        eligible_triangles: eligible,
        oracle_queries: queries,
        debug_rays: tally.rays,
    })
}

/// Cast from each bounding-box corner toward the viewpoint.
///
/// Returns whether every corner is blocked, and the oracle calls made.
/// Stops at the first clear corner. A failed query counts as clear.
fn probe_corners<O: IntersectionOracle + ?Sized>(
    snapshot: &GeometrySnapshot,
    viewpoint: &Viewpoint,
    filter: &OccluderFilter,
    settings: &EstimatorSettings,
    oracle: &O,
) -> (bool, usize) {
    let mut queries = 0;
    for corner in snapshot.bounds().corners() {
        let (outcome, n) = query_segment(
            oracle,
            corner,
            viewpoint.position,
            filter,
            settings.retry_failed_queries,
        );
        queries += n;
        if outcome != SegmentOutcome::Occluded {
            return (false, queries);
        }
    }
    (true, queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frustum::Camera;
    use crate::scene::TriangleScene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sightline_math::Point3;

    const TARGET: EntityId = EntityId(1);

    fn viewpoint() -> Viewpoint {
        Camera::looking_at(Point3::new(0.0, 0.0, 10.0), Point3::origin())
            .viewpoint()
            .unwrap()
    }

    fn scene_with_target(mesh: &TriangleMesh) -> TriangleScene {
        let mut scene = TriangleScene::new();
        scene.add_mesh(TARGET, mesh, &Transform::identity());
        scene
    }

    #[test]
    fn test_unobstructed_cube_fully_visible() {
        let mesh = TriangleMesh::cube(1.0, 1.0, 1.0);
        let scene = scene_with_target(&mesh);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = estimate_visibility(
            &mesh,
            &Transform::identity(),
            TARGET,
            &viewpoint(),
            &EstimatorSettings::default(),
            &scene,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.outcome, Outcome::Sampled);
        assert_eq!(report.visibility, 1.0);
        assert_eq!(report.samples_evaluated, 50);
        assert_eq!(report.eligible_triangles, 2);
        assert_eq!(report.label(), "100.0%");
        assert!(report.debug_rays.is_empty());
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = TriangleMesh::new(Vec::new(), Vec::new());
        let scene = TriangleScene::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = estimate_visibility(
            &mesh,
            &Transform::identity(),
            TARGET,
            &viewpoint(),
            &EstimatorSettings::default(),
            &scene,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.outcome, Outcome::NoEligibleTriangles);
        assert_eq!(report.visibility, 0.0);
        assert_eq!(report.oracle_queries, 0);
    }

    #[test]
    fn test_backfacing_quad_has_no_eligible_triangles() {
        // The quad faces +Z; put the camera below it looking up.
        let mesh = TriangleMesh::quad(2.0, 2.0);
        let scene = scene_with_target(&mesh);
        let vp = Camera::looking_at(Point3::new(0.0, 0.0, -10.0), Point3::origin())
            .viewpoint()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let report = estimate_visibility(
            &mesh,
            &Transform::identity(),
            TARGET,
            &vp,
            &EstimatorSettings::default(),
            &scene,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.outcome, Outcome::NoEligibleTriangles);
        assert_eq!(report.visibility, 0.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mesh = TriangleMesh::cube(1.0, 1.0, 1.0);
        let scene = scene_with_target(&mesh);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = estimate_visibility(
            &mesh,
            &Transform::identity(),
            TARGET,
            &viewpoint(),
            &EstimatorSettings::with_samples(0),
            &scene,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, VisibilityError::InvalidSettings(_)));
    }

    #[test]
    fn test_draw_rays_one_per_sample() {
        let mesh = TriangleMesh::cube(1.0, 1.0, 1.0);
        let scene = scene_with_target(&mesh);
        let settings = EstimatorSettings {
            sample_count: 12,
            draw_rays: true,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let report = estimate_visibility(
            &mesh,
            &Transform::identity(),
            TARGET,
            &viewpoint(),
            &settings,
            &scene,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.debug_rays.len(), 12);
        for ray in &report.debug_rays {
            let end = ray.origin + ray.direction;
            assert!((end - Point3::new(0.0, 0.0, 10.0)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_label_rounding() {
        let mut report = VisibilityReport::invisible(Outcome::Sampled, 0);
        report.visibility = 0.735;
        assert_eq!(report.label(), "73.5%");
        report.visibility = 0.0;
        assert_eq!(report.label(), "0.0%");
        assert!(!report.is_visible());
    }

    #[test]
    fn test_report_json_omits_empty_rays() {
        let report = VisibilityReport::invisible(Outcome::OutsideFrustum, 0);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"outcome\":\"outside_frustum\""));
        assert!(!json.contains("debug_rays"));
    }
}
