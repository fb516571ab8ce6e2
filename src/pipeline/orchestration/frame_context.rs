use image::RgbImage;
use std::sync::Arc;
use tokio::time::Instant;

use crate::common::{DetectionBox, Frame};
use crate::pipeline::detection::DetectionResult;

/// Context object that flows through the processing pipeline
/// Contains all the state needed for processing a single frame
pub struct FrameContext {
    pub frame: Arc<Frame>,
    pub detections: DetectionResult,
    pub now: Instant,
    pub feedback: Vec<String>,
    pub ball: Option<DetectionBox>,
    pub scored: bool,
    pub canvas: Option<RgbImage>,
    pub metrics: FrameMetrics,
    pub processing_start: Instant,
}

impl FrameContext {
    pub fn new(frame: Arc<Frame>, detections: DetectionResult, now: Instant) -> Self {
        Self {
            frame,
            detections,
            now,
            feedback: Vec::new(),
            ball: None,
            scored: false,
            canvas: None,
            metrics: FrameMetrics::new(),
            processing_start: Instant::now(),
        }
    }
}

/// Metrics collected during frame processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    pub detection_duration_us: u64,
    pub shot_analysis_duration_us: u64,
    pub overlay_duration_us: u64,
    pub goal_detection_duration_us: u64,
    pub total_processing_duration_us: u64,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_duration(&mut self, step: ProcessingStepType, duration_us: u64) {
        match step {
            ProcessingStepType::Detection => self.detection_duration_us = duration_us,
            ProcessingStepType::ShotAnalysis => self.shot_analysis_duration_us = duration_us,
            ProcessingStepType::Overlay => self.overlay_duration_us = duration_us,
            ProcessingStepType::GoalDetection => self.goal_detection_duration_us = duration_us,
        }
    }

    pub fn finalize(&mut self, start_time: Instant) {
        self.total_processing_duration_us = start_time.elapsed().as_micros() as u64;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingStepType {
    Detection,
    ShotAnalysis,
    Overlay,
    GoalDetection,
}
