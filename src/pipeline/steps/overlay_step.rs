use crate::common::GoalRegion;
use crate::error::AppError;
use crate::pipeline::orchestration::{FrameContext, ProcessingStep, ProcessingStepType};
use crate::pipeline::services::OverlayRenderer;
use async_trait::async_trait;
use tokio::time::Instant;

/// Renders the frame and its overlays onto a fresh canvas.
pub struct OverlayStep {
    renderer: OverlayRenderer,
    goal: GoalRegion,
}

impl OverlayStep {
    pub fn new(renderer: OverlayRenderer, goal: GoalRegion) -> Self {
        Self { renderer, goal }
    }
}

#[async_trait]
impl ProcessingStep for OverlayStep {
    async fn process(&mut self, context: &mut FrameContext) -> Result<(), AppError> {
        let step_start = Instant::now();

        let canvas = self.renderer.render(
            context.frame.image(),
            context.detections.pose.as_ref(),
            context.ball.as_ref(),
            &self.goal,
        );
        context.canvas = Some(canvas);

        context.metrics.record_duration(
            ProcessingStepType::Overlay,
            step_start.elapsed().as_micros() as u64,
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "OverlayStep"
    }
}
