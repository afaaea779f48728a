//! Torso region estimation.
//!
//! Two estimators implement [`RegionEstimator`]: [`LandmarkEstimator`] derives
//! the torso from shoulder and hip joints, [`SkinHeuristicEstimator`] from the
//! centre of mass of skin-coloured pixels. [`ChainedEstimator`] tries several
//! in order and reports which one succeeded.

use image::RgbaImage;
use log::debug;
use tryon_utils::config::EstimatorSettings;

use crate::{
    error::EstimateError,
    landmarks::{PoseJoint, PoseLandmark, PoseLandmarks},
    region::{EstimatorKind, Region},
    skin::scan_skin,
};

/// Shoulder margin added on each side of the shoulder line.
const SHOULDER_MARGIN: f32 = 0.1;
const SKIN_REGION_WIDTH: f32 = 0.3;
const SKIN_REGION_HEIGHT: f32 = 0.4;

/// Produces a torso region for an image, or a recoverable reason why not.
pub trait RegionEstimator {
    fn kind(&self) -> EstimatorKind;

    fn estimate(&self, image: &RgbaImage) -> Result<Region, EstimateError>;
}

fn ensure_non_empty(image: &RgbaImage) -> Result<(), EstimateError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EstimateError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// Torso from pose landmarks.
///
/// The region spans the shoulder line plus a 10% margin either side and runs
/// from the left shoulder down to the left hip. It is not clamped to the
/// image, so joints near the border can yield a negative origin. Joints with
/// non-normalised coordinates count as missing.
#[derive(Debug, Clone, Default)]
pub struct LandmarkEstimator {
    landmarks: PoseLandmarks,
    min_visibility: f32,
}

impl LandmarkEstimator {
    pub fn new(landmarks: PoseLandmarks) -> Self {
        Self {
            landmarks,
            min_visibility: 0.0,
        }
    }

    /// Treat joints reported below `threshold` visibility as missing.
    pub fn with_min_visibility(mut self, threshold: f32) -> Self {
        self.min_visibility = threshold.clamp(0.0, 1.0);
        self
    }

    fn joint(&self, joint: PoseJoint) -> Result<&PoseLandmark, EstimateError> {
        self.landmarks
            .get(joint)
            .filter(|lm| lm.visibility.is_none_or(|v| v >= self.min_visibility))
            .filter(|lm| {
                let normalised = lm.is_normalised();
                if !normalised {
                    debug!("Ignoring {joint} at ({}, {}): not normalised", lm.x, lm.y);
                }
                normalised
            })
            .ok_or(EstimateError::MissingInput { joint })
    }
}

impl RegionEstimator for LandmarkEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Landmarks
    }

    fn estimate(&self, image: &RgbaImage) -> Result<Region, EstimateError> {
        ensure_non_empty(image)?;
        let (w, h) = image.dimensions();
        let left_shoulder = self.joint(PoseJoint::LeftShoulder)?.point().to_pixels(w, h);
        let right_shoulder = self.joint(PoseJoint::RightShoulder)?.point().to_pixels(w, h);
        let left_hip = self.joint(PoseJoint::LeftHip)?.point().to_pixels(w, h);

        let shoulder_width = (right_shoulder.x - left_shoulder.x).abs();
        let torso_height = (left_hip.y - left_shoulder.y).abs();

        Ok(Region::new(
            left_shoulder.x - SHOULDER_MARGIN * shoulder_width,
            left_shoulder.y,
            (1.0 + 2.0 * SHOULDER_MARGIN) * shoulder_width,
            torso_height,
        ))
    }
}

/// Torso from the centre of mass of skin-coloured samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinHeuristicEstimator {
    pub stride: u32,
    pub min_samples: usize,
}

impl Default for SkinHeuristicEstimator {
    fn default() -> Self {
        Self {
            stride: 4,
            min_samples: 11,
        }
    }
}

impl From<&EstimatorSettings> for SkinHeuristicEstimator {
    fn from(settings: &EstimatorSettings) -> Self {
        Self {
            stride: settings.sample_stride.max(1),
            min_samples: settings.min_skin_samples.max(1),
        }
    }
}

impl RegionEstimator for SkinHeuristicEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::SkinHeuristic
    }

    fn estimate(&self, image: &RgbaImage) -> Result<Region, EstimateError> {
        ensure_non_empty(image)?;
        let scan = scan_skin(image, self.stride);
        let center = scan
            .centroid()
            .filter(|_| scan.count >= self.min_samples)
            .ok_or(EstimateError::InsufficientSignal {
                samples: scan.count,
                required: self.min_samples,
            })?;

        let width = SKIN_REGION_WIDTH * image.width() as f32;
        let height = SKIN_REGION_HEIGHT * image.height() as f32;
        Ok(Region::new(
            (center.x - width / 2.0).max(0.0),
            (center.y - height / 3.0).max(0.0),
            width,
            height,
        ))
    }
}

/// A region together with the estimator that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub kind: EstimatorKind,
    pub region: Region,
}

/// Ordered list of estimators; the first success wins.
pub struct ChainedEstimator {
    stages: Vec<Box<dyn RegionEstimator>>,
}

impl ChainedEstimator {
    pub fn new(first: impl RegionEstimator + 'static) -> Self {
        Self {
            stages: vec![Box::new(first)],
        }
    }

    /// Append a fallback stage.
    pub fn then(mut self, next: impl RegionEstimator + 'static) -> Self {
        self.stages.push(Box::new(next));
        self
    }

    pub fn kinds(&self) -> Vec<EstimatorKind> {
        self.stages.iter().map(|stage| stage.kind()).collect()
    }

    /// Run each stage until one yields a region. Returns the last stage's
    /// error when all of them fail.
    pub fn estimate(&self, image: &RgbaImage) -> Result<Estimate, EstimateError> {
        let mut last_err = None;
        for stage in &self.stages {
            match stage.estimate(image) {
                Ok(region) => {
                    return Ok(Estimate {
                        kind: stage.kind(),
                        region,
                    });
                }
                Err(err) => {
                    debug!("{} estimator produced no region: {err}", stage.kind());
                    last_err = Some(err);
                }
            }
        }
        // Stages are never empty: `new` requires one.
        Err(last_err.unwrap_or(EstimateError::EmptyImage {
            width: image.width(),
            height: image.height(),
        }))
    }
}
