pub mod replay;
pub mod service;

pub use replay::{ReplayDetector, ReplayEntry, UnavailableDetector};
pub use service::{detection_stack, DetectionService, DetectionStack};

use async_trait::async_trait;

use crate::common::{DetectionBox, Frame, HandSnapshot, PoseSnapshot};
use crate::error::DetectionError;

/// Everything the external models reported for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub pose: Option<PoseSnapshot>,
    pub hands: Option<HandSnapshot>,
    pub objects: Vec<DetectionBox>,
}

/// Async contract over the pose, hand and object models.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect_pose(&self, frame: &Frame) -> Result<Option<PoseSnapshot>, DetectionError>;
    async fn detect_hands(&self, frame: &Frame) -> Result<Option<HandSnapshot>, DetectionError>;
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectionBox>, DetectionError>;
    fn name(&self) -> &'static str;
}
