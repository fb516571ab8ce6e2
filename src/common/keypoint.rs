use serde::{Deserialize, Serialize};

use crate::error::PoseError;

pub const POSE_LANDMARK_COUNT: usize = 33;
pub const HAND_LANDMARK_COUNT: usize = 21;
pub const MAX_HANDS: usize = 2;

/// A landmark position in normalized image coordinates. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }
}

/// MediaPipe pose landmark ids used by the coaching rules and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseLandmark {
    Nose = 0,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

/// Hand landmark ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    IndexTip = 8,
}

/// Skeleton edges drawn on the overlay.
pub const POSE_CONNECTIONS: &[(PoseLandmark, PoseLandmark)] = &[
    (PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder),
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftElbow),
    (PoseLandmark::LeftElbow, PoseLandmark::LeftWrist),
    (PoseLandmark::RightShoulder, PoseLandmark::RightElbow),
    (PoseLandmark::RightElbow, PoseLandmark::RightWrist),
    (PoseLandmark::LeftShoulder, PoseLandmark::LeftHip),
    (PoseLandmark::RightShoulder, PoseLandmark::RightHip),
    (PoseLandmark::LeftHip, PoseLandmark::RightHip),
    (PoseLandmark::LeftHip, PoseLandmark::LeftKnee),
    (PoseLandmark::LeftKnee, PoseLandmark::LeftAnkle),
    (PoseLandmark::RightHip, PoseLandmark::RightKnee),
    (PoseLandmark::RightKnee, PoseLandmark::RightAnkle),
];

/// A fully populated body skeleton for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keypoint>", into = "Vec<Keypoint>")]
pub struct PoseSnapshot {
    landmarks: Vec<Keypoint>,
}

impl PoseSnapshot {
    pub fn new(landmarks: Vec<Keypoint>) -> Result<Self, PoseError> {
        if landmarks.len() != POSE_LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount {
                expected: POSE_LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    pub fn landmark(&self, landmark: PoseLandmark) -> Keypoint {
        self.landmarks[landmark as usize]
    }

    pub fn landmarks(&self) -> &[Keypoint] {
        &self.landmarks
    }
}

impl TryFrom<Vec<Keypoint>> for PoseSnapshot {
    type Error = PoseError;

    fn try_from(landmarks: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Self::new(landmarks)
    }
}

impl From<PoseSnapshot> for Vec<Keypoint> {
    fn from(pose: PoseSnapshot) -> Self {
        pose.landmarks
    }
}

/// One detected hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keypoint>", into = "Vec<Keypoint>")]
pub struct HandLandmarks {
    landmarks: Vec<Keypoint>,
}

impl HandLandmarks {
    pub fn new(landmarks: Vec<Keypoint>) -> Result<Self, PoseError> {
        if landmarks.len() != HAND_LANDMARK_COUNT {
            return Err(PoseError::LandmarkCount {
                expected: HAND_LANDMARK_COUNT,
                actual: landmarks.len(),
            });
        }
        Ok(Self { landmarks })
    }

    pub fn landmark(&self, landmark: HandLandmark) -> Keypoint {
        self.landmarks[landmark as usize]
    }
}

impl TryFrom<Vec<Keypoint>> for HandLandmarks {
    type Error = PoseError;

    fn try_from(landmarks: Vec<Keypoint>) -> Result<Self, Self::Error> {
        Self::new(landmarks)
    }
}

impl From<HandLandmarks> for Vec<Keypoint> {
    fn from(hand: HandLandmarks) -> Self {
        hand.landmarks
    }
}

/// All hands detected in a frame, capped at two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HandLandmarks>", into = "Vec<HandLandmarks>")]
pub struct HandSnapshot {
    hands: Vec<HandLandmarks>,
}

impl HandSnapshot {
    pub fn new(mut hands: Vec<HandLandmarks>) -> Self {
        hands.truncate(MAX_HANDS);
        Self { hands }
    }

    pub fn first(&self) -> Option<&HandLandmarks> {
        self.hands.first()
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

impl From<Vec<HandLandmarks>> for HandSnapshot {
    fn from(hands: Vec<HandLandmarks>) -> Self {
        Self::new(hands)
    }
}

impl From<HandSnapshot> for Vec<HandLandmarks> {
    fn from(snapshot: HandSnapshot) -> Self {
        snapshot.hands
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A standing pose with every landmark at the frame centre, then the
    /// rule-relevant joints placed explicitly.
    pub fn pose(shoulder_y: f32, elbow_y: f32, hip_y: f32, knee_y: f32) -> PoseSnapshot {
        let mut landmarks = vec![Keypoint::new(0.5, 0.5); POSE_LANDMARK_COUNT];
        landmarks[PoseLandmark::LeftShoulder as usize] = Keypoint::new(0.45, shoulder_y);
        landmarks[PoseLandmark::LeftElbow as usize] = Keypoint::new(0.40, elbow_y);
        landmarks[PoseLandmark::LeftHip as usize] = Keypoint::new(0.45, hip_y);
        landmarks[PoseLandmark::LeftKnee as usize] = Keypoint::new(0.45, knee_y);
        PoseSnapshot::new(landmarks).unwrap()
    }

    pub fn hand(wrist_y: f32, index_tip_y: f32) -> HandLandmarks {
        let mut landmarks = vec![Keypoint::new(0.3, 0.3); HAND_LANDMARK_COUNT];
        landmarks[HandLandmark::Wrist as usize] = Keypoint::new(0.3, wrist_y);
        landmarks[HandLandmark::IndexTip as usize] = Keypoint::new(0.32, index_tip_y);
        HandLandmarks::new(landmarks).unwrap()
    }
}
