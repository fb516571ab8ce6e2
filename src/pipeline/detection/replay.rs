use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::Detector;
use crate::common::{DetectionBox, Frame, HandSnapshot, PoseSnapshot};
use crate::error::DetectionError;

/// Detections recorded for one frame, one JSON object per line:
/// `{"frame": 3, "pose": [...], "hands": [[...]], "objects": [...]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayEntry {
    pub frame: u64,
    #[serde(default)]
    pub pose: Option<PoseSnapshot>,
    #[serde(default)]
    pub hands: Option<HandSnapshot>,
    #[serde(default)]
    pub objects: Vec<DetectionBox>,
}

/// Serves previously recorded model output keyed by frame index. Frames with
/// no entry report no subject and no objects.
#[derive(Debug, Default)]
pub struct ReplayDetector {
    entries: HashMap<u64, ReplayEntry>,
}

impl ReplayDetector {
    pub fn from_entries(entries: impl IntoIterator<Item = ReplayEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.frame, e)).collect(),
        }
    }

    pub fn parse(contents: &str) -> Result<Self, DetectionError> {
        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<ReplayEntry>(line)
                    .map_err(|e| DetectionError::Replay(format!("line {}: {}", n + 1, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_entries(entries))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DetectionError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DetectionError::Replay(format!("{}: {}", path.display(), e)))?;
        let detector = Self::parse(&contents)?;
        info!(
            "Loaded {} replay detections from {}",
            detector.len(),
            path.display()
        );
        Ok(detector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Detector for ReplayDetector {
    async fn detect_pose(&self, frame: &Frame) -> Result<Option<PoseSnapshot>, DetectionError> {
        Ok(self.entries.get(&frame.index()).and_then(|e| e.pose.clone()))
    }

    async fn detect_hands(&self, frame: &Frame) -> Result<Option<HandSnapshot>, DetectionError> {
        Ok(self.entries.get(&frame.index()).and_then(|e| e.hands.clone()))
    }

    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<DetectionBox>, DetectionError> {
        Ok(self
            .entries
            .get(&frame.index())
            .map(|e| e.objects.clone())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Stand-in used when no model could be loaded. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableDetector;

#[async_trait]
impl Detector for UnavailableDetector {
    async fn detect_pose(&self, _frame: &Frame) -> Result<Option<PoseSnapshot>, DetectionError> {
        Err(DetectionError::ModelUnavailable)
    }

    async fn detect_hands(&self, _frame: &Frame) -> Result<Option<HandSnapshot>, DetectionError> {
        Err(DetectionError::ModelUnavailable)
    }

    async fn detect_objects(&self, _frame: &Frame) -> Result<Vec<DetectionBox>, DetectionError> {
        Err(DetectionError::ModelUnavailable)
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
