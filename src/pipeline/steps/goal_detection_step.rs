use crate::common::best_box;
use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep, ProcessingStepType};
use crate::pipeline::services::GoalDetector;
use async_trait::async_trait;
use tokio::time::Instant;

/// Picks the ball out of the object detections and checks it against the
/// hoop.
pub struct GoalDetectionStep {
    detector: GoalDetector,
    ball_label: String,
    min_confidence: f32,
}

impl GoalDetectionStep {
    pub fn new(detector: GoalDetector, ball_label: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            detector,
            ball_label: ball_label.into(),
            min_confidence,
        }
    }
}

#[async_trait]
impl ProcessingStep for GoalDetectionStep {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let step_start = Instant::now();

        context.ball = best_box(
            &context.detections.objects,
            &self.ball_label,
            self.min_confidence,
        )
        .cloned();
        context.scored = self.detector.observe(context.ball.as_ref(), context.now);

        context.metrics.record_duration(
            ProcessingStepType::GoalDetection,
            step_start.elapsed().as_micros() as u64,
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "GoalDetectionStep"
    }

    fn reset(&mut self) {
        self.detector.reset();
    }
}
