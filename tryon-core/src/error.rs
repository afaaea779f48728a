//! Error types for region estimation and try-on runs.

use thiserror::Error;

use crate::landmarks::PoseJoint;

/// Why an estimator produced no region. Always recoverable: the caller falls
/// back to another estimator or to the centred placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EstimateError {
    /// A joint the landmark estimator needs was not reported.
    #[error("required landmark {joint} is missing")]
    MissingInput { joint: PoseJoint },
    /// Too few skin-coloured samples to trust the centre of mass.
    #[error("found {samples} skin samples, need at least {required}")]
    InsufficientSignal { samples: usize, required: usize },
    /// The image has no pixels to estimate from.
    #[error("cannot estimate a region on an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },
}

/// Failures surfaced to the caller of a try-on run.
#[derive(Debug, Error)]
pub enum TryOnError {
    /// An external capability the run was configured to use is not available.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    /// The session was asked to process before both images were supplied.
    #[error("{0} image has not been provided")]
    MissingImage(&'static str),
    /// Another run on the same session is still in progress.
    #[error("a try-on run is already in progress")]
    Busy,
    /// An input image cannot be composited (for example it has no pixels).
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, TryOnError>;
