//! Core virtual try-on primitives.
//!
//! This crate estimates where a torso sits in a model photo, either from pose
//! landmarks or from a skin-colour heuristic, and composites a product image
//! over it with an aspect-preserving placement.

/// Alpha compositing of the overlay and its drop shadow.
pub mod compositor;
/// Estimation and session error types.
pub mod error;
/// Torso region estimators.
pub mod estimator;
/// Pose landmarks and landmark providers.
pub mod landmarks;
/// Overlay placement geometry.
pub mod placement;
/// Estimated regions.
pub mod region;
/// Try-on session that owns the inputs for a run.
pub mod session;
/// Skin-colour classification.
pub mod skin;

pub use compositor::{blend_over, compose, draw_overlay};
pub use error::{EstimateError, TryOnError};
pub use estimator::{
    ChainedEstimator, Estimate, LandmarkEstimator, RegionEstimator, SkinHeuristicEstimator,
};
pub use landmarks::{
    JsonLandmarkFile, LandmarkProvider, PoseJoint, PoseLandmark, PoseLandmarks, StaticLandmarks,
    UnavailableProvider,
};
pub use placement::{
    DropShadow, PixelRect, PlacementResult, PlacementSettings, center_placement, place_in_region,
};
pub use region::{EstimatorKind, Region};
pub use session::{TryOnConfig, TryOnOutcome, TryOnSession};
pub use skin::{SkinScan, is_skin_color, scan_skin};
