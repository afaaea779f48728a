//! Body landmarks and the providers that deliver them.
//!
//! Landmarks follow the 33-point MediaPipe pose topology and are normalised
//! to `[0, 1]` of the image they were detected on. A provider resolves once
//! per run through a future, so estimation itself never waits on callbacks.

use std::{
    fmt,
    future::{self, Future},
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tryon_utils::Point;

use crate::error::{Result, TryOnError};

/// Coordinates accepted as normalised. Detectors report joints slightly
/// outside the frame, so half a frame of slack is allowed on each side.
const NORMALISED_RANGE: RangeInclusive<f32> = -0.5..=1.5;

/// Joints the estimator cares about, with their pose indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseJoint {
    LeftShoulder,
    RightShoulder,
    LeftHip,
}

impl PoseJoint {
    /// Index of the joint in a 33-point pose landmark list.
    pub const fn index(self) -> usize {
        match self {
            PoseJoint::LeftShoulder => 11,
            PoseJoint::RightShoulder => 12,
            PoseJoint::LeftHip => 23,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PoseJoint::LeftShoulder => "left shoulder",
            PoseJoint::RightShoulder => "right shoulder",
            PoseJoint::LeftHip => "left hip",
        }
    }
}

impl fmt::Display for PoseJoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One normalised landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLandmark {
    pub x: f32,
    pub y: f32,
    /// Detector confidence that the joint is visible, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl PoseLandmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// False for non-finite values and for coordinates far outside the
    /// frame, such as landmarks given in pixels.
    pub fn is_normalised(&self) -> bool {
        NORMALISED_RANGE.contains(&self.x) && NORMALISED_RANGE.contains(&self.y)
    }
}

/// Ordered landmark list; absent joints are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks {
    points: Vec<Option<PoseLandmark>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LandmarkDocument {
    List(Vec<Option<PoseLandmark>>),
    Wrapped {
        #[serde(alias = "poseLandmarks", alias = "pose_landmarks")]
        landmarks: Vec<Option<PoseLandmark>>,
    },
}

impl PoseLandmarks {
    pub fn new(points: Vec<Option<PoseLandmark>>) -> Self {
        Self { points }
    }

    /// Set a single joint, growing the list as needed.
    pub fn with_joint(mut self, joint: PoseJoint, landmark: PoseLandmark) -> Self {
        let idx = joint.index();
        if self.points.len() <= idx {
            self.points.resize(idx + 1, None);
        }
        self.points[idx] = Some(landmark);
        self
    }

    pub fn get(&self, joint: PoseJoint) -> Option<&PoseLandmark> {
        self.points.get(joint.index()).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Parse either a bare JSON array or an object holding a `landmarks`
    /// (or `poseLandmarks`) array. Entries may be `null`.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        let points = match serde_json::from_str::<LandmarkDocument>(json)? {
            LandmarkDocument::List(points) | LandmarkDocument::Wrapped { landmarks: points } => {
                points
            }
        };
        Ok(Self { points })
    }
}

/// Asynchronous source of pose landmarks for one image.
///
/// `Ok(None)` means the provider ran and found no person; an error means the
/// provider itself is not usable.
pub trait LandmarkProvider {
    fn detect(&self, image: &RgbaImage) -> impl Future<Output = Result<Option<PoseLandmarks>>>;
}

/// Landmarks known up front, e.g. computed by an earlier pipeline stage.
#[derive(Debug, Clone, Default)]
pub struct StaticLandmarks(pub Option<PoseLandmarks>);

impl LandmarkProvider for StaticLandmarks {
    fn detect(&self, _image: &RgbaImage) -> impl Future<Output = Result<Option<PoseLandmarks>>> {
        future::ready(Ok(self.0.clone()))
    }
}

/// Landmarks stored as JSON on disk, read when the run asks for them.
#[derive(Debug, Clone)]
pub struct JsonLandmarkFile {
    path: PathBuf,
}

impl JsonLandmarkFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LandmarkProvider for JsonLandmarkFile {
    fn detect(&self, _image: &RgbaImage) -> impl Future<Output = Result<Option<PoseLandmarks>>> {
        let result = std::fs::read_to_string(&self.path)
            .map_err(|err| {
                TryOnError::DependencyUnavailable(format!(
                    "cannot read landmarks {}: {err}",
                    self.path.display()
                ))
            })
            .and_then(|contents| {
                PoseLandmarks::from_json_str(&contents).map_err(|err| {
                    TryOnError::DependencyUnavailable(format!(
                        "cannot parse landmarks {}: {err}",
                        self.path.display()
                    ))
                })
            })
            .map(|landmarks| (!landmarks.is_empty()).then_some(landmarks));
        future::ready(result)
    }
}

/// Stand-in for a pose detector that was never initialised.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl LandmarkProvider for UnavailableProvider {
    fn detect(&self, _image: &RgbaImage) -> impl Future<Output = Result<Option<PoseLandmarks>>> {
        future::ready(Err(TryOnError::DependencyUnavailable(self.reason.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_joint_places_landmarks_at_pose_indices() {
        let landmarks = PoseLandmarks::default()
            .with_joint(PoseJoint::LeftHip, PoseLandmark::new(0.3, 0.6))
            .with_joint(PoseJoint::LeftShoulder, PoseLandmark::new(0.3, 0.2));
        assert_eq!(landmarks.len(), 24);
        assert_eq!(
            landmarks.get(PoseJoint::LeftShoulder).map(PoseLandmark::point),
            Some(Point::new(0.3, 0.2))
        );
        assert!(landmarks.get(PoseJoint::RightShoulder).is_none());
    }

    #[test]
    fn parses_bare_and_wrapped_json() {
        let mut entries = vec!["null".to_string(); 33];
        entries[11] = r#"{"x":0.3,"y":0.2,"visibility":0.9}"#.to_string();
        let bare = format!("[{}]", entries.join(","));
        let parsed = PoseLandmarks::from_json_str(&bare).expect("bare list");
        assert_eq!(parsed.len(), 33);
        assert_eq!(
            parsed.get(PoseJoint::LeftShoulder).and_then(|lm| lm.visibility),
            Some(0.9)
        );

        let wrapped = format!(r#"{{"poseLandmarks":[{}]}}"#, entries.join(","));
        assert_eq!(PoseLandmarks::from_json_str(&wrapped).expect("wrapped"), parsed);

        assert!(PoseLandmarks::from_json_str(r#"{"nope":1}"#).is_err());
    }

    #[test]
    fn providers_resolve_once() {
        let image = RgbaImage::new(4, 4);
        let known = PoseLandmarks::default()
            .with_joint(PoseJoint::LeftShoulder, PoseLandmark::new(0.5, 0.5));

        let resolved = pollster::block_on(StaticLandmarks(Some(known.clone())).detect(&image))
            .expect("static provider");
        assert_eq!(resolved, Some(known));

        let err = pollster::block_on(UnavailableProvider::new("pose model not loaded").detect(&image))
            .unwrap_err();
        assert!(matches!(err, TryOnError::DependencyUnavailable(msg) if msg.contains("pose model")));
    }

    #[test]
    fn json_file_provider_reads_and_reports_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = RgbaImage::new(4, 4);

        let path = dir.path().join("pose.json");
        std::fs::write(&path, r#"{"landmarks":[{"x":0.1,"y":0.2}]}"#).expect("write");
        let found = pollster::block_on(JsonLandmarkFile::new(&path).detect(&image)).expect("read");
        assert_eq!(found.map(|lm| lm.len()), Some(1));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "[null, null]").expect("write");
        let none = pollster::block_on(JsonLandmarkFile::new(&empty).detect(&image)).expect("read");
        assert!(none.is_none(), "all-null list means no person was found");

        let missing = JsonLandmarkFile::new(dir.path().join("missing.json"));
        assert!(matches!(
            pollster::block_on(missing.detect(&image)),
            Err(TryOnError::DependencyUnavailable(_))
        ));
    }
}
