use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep, ProcessingStepType};
use crate::pipeline::services::ShotHeuristics;
use async_trait::async_trait;
use tokio::time::Instant;

/// Evaluates the shooting form rules for the frame's keypoints.
pub struct ShotAnalysisStep {
    heuristics: ShotHeuristics,
}

impl ShotAnalysisStep {
    pub fn new(heuristics: ShotHeuristics) -> Self {
        Self { heuristics }
    }
}

#[async_trait]
impl ProcessingStep for ShotAnalysisStep {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let step_start = Instant::now();

        context.feedback = self.heuristics.evaluate(
            context.detections.pose.as_ref(),
            context.detections.hands.as_ref(),
        );

        context.metrics.record_duration(
            ProcessingStepType::ShotAnalysis,
            step_start.elapsed().as_micros() as u64,
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ShotAnalysisStep"
    }
}
