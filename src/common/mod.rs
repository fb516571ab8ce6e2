pub mod detection;
pub mod frame;
pub mod keypoint;

pub use detection::{best_box, DetectionBox, GoalRegion, Rect};
pub use frame::Frame;
pub use keypoint::{
    HandLandmark, HandLandmarks, HandSnapshot, Keypoint, PoseLandmark, PoseSnapshot,
    POSE_CONNECTIONS,
};
