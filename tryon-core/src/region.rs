//! Estimated body regions in pixel space.

use serde::Serialize;
use std::fmt;
use tryon_utils::Point;

/// Axis-aligned torso estimate in pixel coordinates.
///
/// Width and height are never negative. The origin is clamped to `>= 0` by
/// the skin heuristic only; landmark regions keep whatever the joints imply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when any part of the region lies left of or above the image origin.
    pub fn extends_before_origin(&self) -> bool {
        self.x < 0.0 || self.y < 0.0
    }
}

/// Which estimator produced a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Landmarks,
    SkinHeuristic,
}

impl EstimatorKind {
    pub fn as_label(self) -> &'static str {
        match self {
            EstimatorKind::Landmarks => "landmarks",
            EstimatorKind::SkinHeuristic => "skin_heuristic",
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
