pub mod geometry;
pub mod source;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use geometry::angle_at;
pub use source::{JsonlPoseSource, PoseSource};

/// Body joints the exercise rules can read.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 12] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Position of the joint in the 33 point MediaPipe pose landmark list
    pub fn mediapipe_index(&self) -> usize {
        match self {
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Joint::LeftShoulder => write!(f, "Left Shoulder"),
            Joint::RightShoulder => write!(f, "Right Shoulder"),
            Joint::LeftElbow => write!(f, "Left Elbow"),
            Joint::RightElbow => write!(f, "Right Elbow"),
            Joint::LeftWrist => write!(f, "Left Wrist"),
            Joint::RightWrist => write!(f, "Right Wrist"),
            Joint::LeftHip => write!(f, "Left Hip"),
            Joint::RightHip => write!(f, "Right Hip"),
            Joint::LeftKnee => write!(f, "Left Knee"),
            Joint::RightKnee => write!(f, "Right Knee"),
            Joint::LeftAnkle => write!(f, "Left Ankle"),
            Joint::RightAnkle => write!(f, "Right Ankle"),
        }
    }
}

/// Normalized image coordinates. Both axes go from 0 to 1, y grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f32,
    pub y: f32,
}

impl Position2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Joint positions detected in a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    positions: HashMap<Joint, Position2D>,
}

impl LandmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a landmark set from keypoints listed in MediaPipe order. Joints past the end of the
    /// list are left out.
    pub fn from_mediapipe(keypoints: &[[f32; 2]]) -> Self {
        let positions = Joint::ALL
            .iter()
            .filter_map(|joint| {
                keypoints
                    .get(joint.mediapipe_index())
                    .map(|[x, y]| (*joint, Position2D::new(*x, *y)))
            })
            .collect();
        Self { positions }
    }

    pub fn with(mut self, joint: Joint, position: Position2D) -> Self {
        self.positions.insert(joint, position);
        self
    }

    pub fn get(&self, joint: Joint) -> Option<Position2D> {
        self.positions.get(&joint).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One frame delivered by the pose estimation model. `landmarks` is `None` when nobody was
/// detected in the frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPoseFrame")]
pub struct PoseFrame {
    /// Capture time in milliseconds since the unix epoch
    pub timestamp_ms: Option<i64>,
    pub landmarks: Option<LandmarkSet>,
}

impl PoseFrame {
    pub fn detected(timestamp_ms: i64, landmarks: LandmarkSet) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            landmarks: Some(landmarks),
        }
    }

    pub fn empty(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            landmarks: None,
        }
    }
}

// Frames on the wire carry either named landmarks or the raw MediaPipe keypoint list
#[derive(Deserialize)]
struct RawPoseFrame {
    #[serde(default)]
    timestamp_ms: Option<i64>,
    #[serde(default)]
    landmarks: Option<LandmarkSet>,
    #[serde(default)]
    keypoints: Option<Vec<[f32; 2]>>,
}

impl From<RawPoseFrame> for PoseFrame {
    fn from(raw: RawPoseFrame) -> Self {
        let landmarks = raw
            .landmarks
            .or_else(|| raw.keypoints.map(|k| LandmarkSet::from_mediapipe(&k)));
        Self {
            timestamp_ms: raw.timestamp_ms,
            landmarks,
        }
    }
}
