//! Estimator settings.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisibilityError};

/// How a random draw over the total area is mapped to a triangle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// First slot whose cumulative area exceeds the draw. Eligible triangles
    /// are picked in proportion to their area.
    #[default]
    AreaWeighted,
    /// `round(r / total * (n - 1))`. Ignores individual areas; every slot is
    /// roughly equally likely except the two end slots, which get half weight.
    IndexRemap,
}

/// Configuration kept across evaluation cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Surface samples per cycle.
    pub sample_count: usize,
    /// Record a debug ray per sample in the report.
    pub draw_rays: bool,
    /// Triangle selection mapping.
    pub sampling: SamplingStrategy,
    /// Edge length of the cube around each triangle centroid used for the
    /// per-triangle frustum test.
    pub triangle_bounds_size: f64,
    /// Consecutive excluded slots after which index remapping gives up.
    pub max_draw_attempts: usize,
    /// Retry a failed oracle query once before dropping the sample.
    pub retry_failed_queries: bool,
    /// Run the per-sample ray queries on the rayon pool.
    pub parallel: bool,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            sample_count: 50,
            draw_rays: false,
            sampling: SamplingStrategy::AreaWeighted,
            triangle_bounds_size: 1.0,
            max_draw_attempts: 1_000_000,
            retry_failed_queries: true,
            parallel: false,
        }
    }
}

impl EstimatorSettings {
    /// Default settings with a different sample count.
    pub fn with_samples(sample_count: usize) -> Self {
        Self {
            sample_count,
            ..Self::default()
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(VisibilityError::InvalidSettings(
                "sample_count must be at least 1".into(),
            ));
        }
        if !(self.triangle_bounds_size > 0.0) || !self.triangle_bounds_size.is_finite() {
            return Err(VisibilityError::InvalidSettings(
                "triangle_bounds_size must be positive".into(),
            ));
        }
        if self.max_draw_attempts == 0 {
            return Err(VisibilityError::InvalidSettings(
                "max_draw_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
