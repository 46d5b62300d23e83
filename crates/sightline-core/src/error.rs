//! Error types for visibility estimation.

use thiserror::Error;

use crate::oracle::OracleError;

/// Errors that can occur while estimating visibility.
#[derive(Error, Debug)]
pub enum VisibilityError {
    /// No mesh was bound to the point of interest.
    #[error("invalid configuration: no mesh bound")]
    MissingMesh,

    /// No viewpoint was bound to the point of interest.
    #[error("invalid configuration: no viewpoint bound")]
    MissingViewpoint,

    /// Estimator settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Camera parameters cannot produce a view frustum.
    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    /// Mesh topology is inconsistent.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Every occlusion query failed, so no sample could be evaluated.
    #[error("all {samples} occlusion queries failed: {source}")]
    Oracle {
        /// Number of samples attempted.
        samples: usize,
        /// The last failure reported by the oracle.
        #[source]
        source: OracleError,
    },

    /// The rejection sampler gave up before landing on an eligible triangle.
    #[error("triangle sampling exhausted after {attempts} rejected draws")]
    SamplingExhausted {
        /// Number of consecutive rejected draws.
        attempts: usize,
    },
}

/// Result type for visibility operations.
pub type Result<T> = std::result::Result<T, VisibilityError>;
